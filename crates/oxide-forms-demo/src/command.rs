//! Line commands understood by the demo.

use anyhow::{Result, bail};

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Set a field's value.
    Change { field: String, value: String },
    /// Focus a field.
    Focus(String),
    /// Blur a field.
    Blur(String),
    /// Submit the form.
    Submit,
    /// Print every field.
    Show,
    /// Print usage.
    Help,
    /// Leave.
    Quit,
}

pub const USAGE: &str = "\
commands:
  <field> <value>   set a field (e.g. `email harry@example.com`)
  <field>           clear a field
  focus <field>     focus a field (hides its error)
  blur <field>      blur a field (shows its error again)
  submit            submit the form
  show              print every field
  help              print this text
  quit              leave";

/// Parses one line. Field names are not checked here.
pub fn parse(line: &str) -> Result<Command> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        "" => bail!("empty command"),
        "submit" => Command::Submit,
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "focus" | "blur" if rest.is_empty() => bail!("`{word}` needs a field name"),
        "focus" => Command::Focus(rest.to_string()),
        "blur" => Command::Blur(rest.to_string()),
        field => Command::Change {
            field: field.to_string(),
            value: rest.to_string(),
        },
    };
    Ok(command)
}
