//! oxide-forms-demo
//!
//! Drives a sign-up form from standard input, one command per line.

mod command;
mod signup;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use oxide_live_forms::{
    CallbackOwner, Field, FieldPhase, FieldRenderer, FieldView, FormConfig, HtmlFieldRenderer,
    SubmitEvent, SubmitOutcome, SubmitPolicy,
};

use crate::command::{Command, USAGE};
use crate::signup::{Signup, SignupConfig};

/// Live-validated sign-up form.
#[derive(Parser)]
#[command(name = "oxide-forms-demo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Refuse to submit while the form is invalid.
    #[arg(long)]
    require_valid: bool,

    /// Latency of the email uniqueness check, in milliseconds.
    #[arg(long, default_value_t = 200)]
    latency_ms: u64,

    /// Email address the uniqueness check treats as taken.
    #[arg(long, default_value = "harry@example.com")]
    taken: String,

    /// Minimum password length.
    #[arg(long, default_value_t = 8)]
    min_password: usize,

    /// Print fields as HTML on `show`.
    #[arg(long)]
    html: bool,
}

/// Owner callbacks forwarded to the input loop.
#[derive(Debug, Clone, Copy)]
enum OwnerEvent {
    Submit,
    Valid,
    Invalid,
}

struct ConsoleRenderer;

impl FieldRenderer for ConsoleRenderer {
    fn render(&self, view: &FieldView) {
        let status = match view.phase {
            FieldPhase::Unvalidated => "unvalidated",
            FieldPhase::Validating => "validating",
            FieldPhase::Valid => "valid",
            FieldPhase::Invalid => "invalid",
        };
        match &view.error {
            Some(error) => println!("  {} [{status}] {error}", view.label),
            None => println!("  {} [{status}]", view.label),
        }
    }
}

/// Prints to the console and keeps HTML for `show`.
struct DemoRenderer {
    html: HtmlFieldRenderer,
}

impl FieldRenderer for DemoRenderer {
    fn render(&self, view: &FieldView) {
        ConsoleRenderer.render(view);
        self.html.render(view);
    }
}

fn owner(events: mpsc::UnboundedSender<OwnerEvent>) -> CallbackOwner {
    let (submit, valid, invalid) = (events.clone(), events.clone(), events);
    CallbackOwner::new()
        .on_submit(move || {
            let _ = submit.send(OwnerEvent::Submit);
        })
        .on_valid(move || {
            let _ = valid.send(OwnerEvent::Valid);
        })
        .on_invalid(move || {
            let _ = invalid.send(OwnerEvent::Invalid);
        })
}

fn lookup<'a>(signup: &'a Signup, name: &str) -> Option<&'a Field> {
    let field = signup.field(name);
    if field.is_none() {
        warn!(field = name, "no such field");
    }
    field
}

fn show(signup: &Signup, renderer: &DemoRenderer, html: bool) {
    for field in &signup.fields {
        if html {
            if let Some(markup) = renderer.html.markup(field.name()) {
                println!("{markup}");
            }
        } else {
            ConsoleRenderer.render(&field.view());
        }
    }
    let submit = if signup.form.submit_disabled() {
        "disabled"
    } else {
        "enabled"
    };
    println!("  [submit: {submit}]");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let policy = if cli.require_valid {
        SubmitPolicy::RequireValid
    } else {
        SubmitPolicy::Always
    };
    let config = SignupConfig {
        taken_email: cli.taken,
        lookup_latency: Duration::from_millis(cli.latency_ms),
        min_password: cli.min_password,
        form: FormConfig::new().submit_policy(policy),
    };

    let (tx, mut events) = mpsc::unbounded_channel();
    let renderer = Arc::new(DemoRenderer {
        html: HtmlFieldRenderer::new(),
    });
    let signup = Signup::build(&config, owner(tx), renderer.clone())?;

    info!(policy = ?policy, "sign-up form ready");
    println!("{USAGE}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let command = match command::parse(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        warn!("{e}");
                        continue;
                    }
                };

                match command {
                    Command::Quit => break,
                    Command::Help => println!("{USAGE}"),
                    Command::Show => show(&signup, &renderer, cli.html),
                    Command::Submit => {
                        let mut event = SubmitEvent::new();
                        if signup.form.submit(&mut event) == SubmitOutcome::Blocked {
                            println!("form is invalid; not submitting");
                        }
                    }
                    Command::Focus(name) => {
                        if let Some(field) = lookup(&signup, &name) {
                            field.on_focus();
                        }
                    }
                    Command::Blur(name) => {
                        if let Some(field) = lookup(&signup, &name) {
                            field.on_blur();
                        }
                    }
                    Command::Change { field, value } => {
                        if let Some(field) = lookup(&signup, &field) {
                            if let Err(e) = field.on_change(value) {
                                warn!(field = field.name(), "{e}");
                            }
                        }
                    }
                }
            }
            Some(event) = events.recv() => match event {
                OwnerEvent::Submit => {
                    println!("{}", serde_json::to_string_pretty(&signup.values())?);
                }
                OwnerEvent::Valid => println!("form is valid; submit enabled"),
                OwnerEvent::Invalid => println!("form is invalid; submit disabled"),
            },
        }
    }

    Ok(())
}
