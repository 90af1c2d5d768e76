#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use oxide_live_forms::{
    CallbackOwner, Field, FieldConfig, FieldRenderer, FieldView, Form, FormConfig, InputKind,
    Validator, ValidatorFault,
};

pub const TAKEN_EMAIL: &str = "harry@example.com";

/// Counts owner callbacks.
#[derive(Debug, Default)]
pub struct OwnerCalls {
    pub submit: AtomicUsize,
    pub valid: AtomicUsize,
    pub invalid: AtomicUsize,
}

impl OwnerCalls {
    pub fn submits(&self) -> usize {
        self.submit.load(Ordering::SeqCst)
    }

    pub fn valids(&self) -> usize {
        self.valid.load(Ordering::SeqCst)
    }

    pub fn invalids(&self) -> usize {
        self.invalid.load(Ordering::SeqCst)
    }
}

pub fn form_with(config: FormConfig) -> (Form, Arc<OwnerCalls>) {
    let calls = Arc::new(OwnerCalls::default());
    let (s, v, i) = (calls.clone(), calls.clone(), calls.clone());
    let owner = CallbackOwner::new()
        .on_submit(move || {
            s.submit.fetch_add(1, Ordering::SeqCst);
        })
        .on_valid(move || {
            v.valid.fetch_add(1, Ordering::SeqCst);
        })
        .on_invalid(move || {
            i.invalid.fetch_add(1, Ordering::SeqCst);
        });
    (Form::with_config(owner, config), calls)
}

pub fn form() -> (Form, Arc<OwnerCalls>) {
    form_with(FormConfig::default())
}

/// Pretends to ask a server whether the address is in use.
pub fn taken_email_validator() -> Validator {
    Validator::from_async(
        "unique_email",
        "Email address is already taken.",
        |email| async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, ValidatorFault>(email != TAKEN_EMAIL)
        },
    )
}

pub fn email_config() -> FieldConfig {
    FieldConfig::new("email", "Email")
        .validator(
            Validator::pattern("@", "Invalid email address")
                .unwrap_or_else(|e| panic!("pattern failed to compile: {e}")),
        )
        .validator(taken_email_validator())
}

pub fn password_config() -> FieldConfig {
    FieldConfig::new("password", "Password")
        .kind(InputKind::Password)
        .validator(Validator::min_length(8).with_message("Minimum 8 characters."))
}

pub fn headless(config: FieldConfig, form: &Form) -> Field {
    Field::headless(config, form.handle()).unwrap_or_else(|e| panic!("field setup failed: {e}"))
}

/// Renderer that remembers every view it was given.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    views: Mutex<Vec<FieldView>>,
}

impl RecordingRenderer {
    pub fn views(&self) -> Vec<FieldView> {
        self.views.lock().unwrap().clone()
    }

    pub fn last(&self) -> FieldView {
        self.views
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("renderer was never called")
    }
}

impl FieldRenderer for RecordingRenderer {
    fn render(&self, view: &FieldView) {
        self.views.lock().unwrap().push(view.clone());
    }
}
