//! Field controller.
//!
//! A [`Field`] owns one input's value, error message and focus state. Every
//! change starts a validation run: all validators are invoked with the new
//! value, their verdicts are joined, and the first failure in declaration
//! order decides the error message. The outcome is reported to the form
//! through the injected [`FormHandle`].
//!
//! Runs are numbered. When a run completes after a newer one was issued its
//! result is dropped, so the most recently issued run always determines the
//! field's final state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::TryFutureExt;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::{FormError, Result, ValidatorFault};
use crate::form::FormHandle;
use crate::render::{FieldRenderer, FieldView, NoopRenderer};
use crate::validation::{Validator, first_failure};

/// The kind of input a field is drawn as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// Plain text.
    #[default]
    Text,
    /// Email address.
    Email,
    /// Masked password.
    Password,
    /// Numeric input.
    Number,
    /// Hidden input.
    Hidden,
}

impl InputKind {
    /// Returns the HTML input type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Password => "password",
            Self::Number => "number",
            Self::Hidden => "hidden",
        }
    }
}

/// Validation phase of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldPhase {
    /// No run has completed yet.
    Unvalidated,
    /// The latest run is still in flight.
    Validating,
    /// The latest completed run passed.
    Valid,
    /// The latest completed run failed.
    Invalid,
}

/// Definition of a field.
#[derive(Debug, Clone)]
pub struct FieldConfig {
    /// Field name, unique within a form.
    pub name: String,
    /// Field label.
    pub label: String,
    /// Input kind.
    pub kind: InputKind,
    /// Validators, in the order their messages take precedence.
    pub validators: Vec<Validator>,
}

impl FieldConfig {
    /// Creates a text field definition without validators.
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: InputKind::default(),
            validators: Vec::new(),
        }
    }

    /// Sets the input kind.
    #[must_use]
    pub fn kind(mut self, kind: InputKind) -> Self {
        self.kind = kind;
        self
    }

    /// Adds a validator.
    #[must_use]
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Adds several validators.
    #[must_use]
    pub fn validators(mut self, validators: impl IntoIterator<Item = Validator>) -> Self {
        self.validators.extend(validators);
        self
    }
}

/// Local UI state of a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldState {
    /// Current raw value.
    pub value: String,
    /// Message of the first failing validator of the latest run.
    pub error_message: Option<String>,
    /// Whether the input has focus.
    pub focused: bool,
}

impl FieldState {
    /// The error to show: hidden while the user is typing.
    pub fn displayed_error(&self) -> Option<&str> {
        if self.focused {
            return None;
        }
        self.error_message.as_deref()
    }
}

/// How a validation run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every validator passed.
    Valid,
    /// A validator failed; carries its message.
    Invalid(String),
    /// A validator faulted; the field keeps its previous validity.
    Faulted {
        /// Name of the faulting validator.
        validator: String,
        /// What went wrong.
        fault: ValidatorFault,
    },
    /// A newer run was issued before this one completed.
    Superseded,
}

/// A spawned validation run.
#[derive(Debug)]
pub struct ValidationRun {
    field: String,
    generation: u64,
    handle: JoinHandle<RunOutcome>,
}

impl ValidationRun {
    /// Returns the run's generation number.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Waits for the run to finish.
    pub async fn outcome(self) -> Result<RunOutcome> {
        self.handle.await.map_err(|e| FormError::RunAborted {
            field: self.field,
            message: e.to_string(),
        })
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: FieldState,
    generation: u64,
    pending: bool,
    settled: Option<bool>,
}

impl Inner {
    fn phase(&self) -> FieldPhase {
        if self.pending {
            return FieldPhase::Validating;
        }
        match self.settled {
            None => FieldPhase::Unvalidated,
            Some(true) => FieldPhase::Valid,
            Some(false) => FieldPhase::Invalid,
        }
    }
}

struct Core {
    config: FieldConfig,
    inner: Mutex<Inner>,
    /// Held from the generation check until the form has the report, so a
    /// superseded run cannot report after a newer one.
    report_gate: Mutex<()>,
    form: FormHandle,
    renderer: Arc<dyn FieldRenderer>,
}

impl Core {
    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn view(&self) -> FieldView {
        let inner = self.inner();
        FieldView {
            name: self.config.name.clone(),
            label: self.config.label.clone(),
            kind: self.config.kind,
            value: inner.state.value.clone(),
            error: inner.state.displayed_error().map(str::to_string),
            phase: inner.phase(),
        }
    }

    fn render(&self) {
        let view = self.view();
        self.renderer.render(&view);
    }

    fn settle(
        &self,
        generation: u64,
        results: std::result::Result<Vec<bool>, (String, ValidatorFault)>,
    ) -> RunOutcome {
        let name = self.config.name.as_str();
        let gate = self.report_gate.lock().unwrap_or_else(PoisonError::into_inner);
        let outcome = {
            let mut inner = self.inner();
            if inner.generation != generation {
                debug!(
                    field = name,
                    generation,
                    current = inner.generation,
                    "discarding superseded validation run"
                );
                return RunOutcome::Superseded;
            }
            inner.pending = false;

            match results {
                Err((validator, fault)) => {
                    error!(
                        field = name,
                        validator = validator.as_str(),
                        fault = fault.message.as_str(),
                        "error validating"
                    );
                    RunOutcome::Faulted { validator, fault }
                }
                Ok(results) => match first_failure(&self.config.validators, &results) {
                    Some(failed) => {
                        let message = failed.message().to_string();
                        inner.state.error_message = Some(message.clone());
                        inner.settled = Some(false);
                        RunOutcome::Invalid(message)
                    }
                    None => {
                        inner.state.error_message = None;
                        inner.settled = Some(true);
                        RunOutcome::Valid
                    }
                },
            }
        };

        match &outcome {
            RunOutcome::Valid => self.form.report_valid(name),
            RunOutcome::Invalid(_) => self.form.report_invalid(name),
            RunOutcome::Faulted { .. } | RunOutcome::Superseded => {}
        }
        drop(gate);

        self.render();
        outcome
    }
}

/// Controller for one form field.
///
/// Cloning yields another handle to the same field.
#[derive(Clone)]
pub struct Field {
    core: Arc<Core>,
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("config", &self.core.config)
            .field("inner", &*self.core.inner())
            .finish_non_exhaustive()
    }
}

impl Field {
    /// Creates a field, registers it with the form and renders it once.
    pub fn new(
        config: FieldConfig,
        form: FormHandle,
        renderer: Arc<dyn FieldRenderer>,
    ) -> Result<Self> {
        if config.name.trim().is_empty() {
            return Err(FormError::MissingName {
                label: config.label,
            });
        }

        let field = Self {
            core: Arc::new(Core {
                config,
                inner: Mutex::new(Inner::default()),
                report_gate: Mutex::new(()),
                form,
                renderer,
            }),
        };
        field.on_register();
        field.core.render();
        Ok(field)
    }

    /// Creates a field that renders nowhere.
    pub fn headless(config: FieldConfig, form: FormHandle) -> Result<Self> {
        Self::new(config, form, Arc::new(NoopRenderer))
    }

    fn on_register(&self) {
        self.core.form.register(&self.core.config.name);
    }

    /// Stores a new value and validates it.
    ///
    /// Fails without touching the field when called outside a tokio runtime.
    pub fn on_change(&self, value: impl Into<String>) -> Result<ValidationRun> {
        let runtime = Handle::try_current()?;
        let value = value.into();
        debug!(
            field = self.core.config.name.as_str(),
            value = value.as_str(),
            "value changed"
        );
        self.core.inner().state.value = value;
        Ok(self.start_run(&runtime))
    }

    /// Validates the current value.
    ///
    /// Every predicate is invoked before this returns; the join and the
    /// report to the form happen on a spawned task.
    pub fn run_validators(&self) -> Result<ValidationRun> {
        let runtime = Handle::try_current()?;
        Ok(self.start_run(&runtime))
    }

    fn start_run(&self, runtime: &Handle) -> ValidationRun {
        let (generation, value) = {
            let mut inner = self.core.inner();
            inner.generation += 1;
            inner.pending = true;
            (inner.generation, inner.state.value.clone())
        };
        self.core.render();

        let verdicts = self.core.config.validators.iter().map(|validator| {
            let name = validator.name().to_string();
            validator
                .check(&value)
                .map_err(move |fault| (name, fault))
        });
        let joined = try_join_all(verdicts);

        let core = Arc::clone(&self.core);
        let handle = runtime.spawn(async move {
            let results = joined.await;
            core.settle(generation, results)
        });

        ValidationRun {
            field: self.core.config.name.clone(),
            generation,
            handle,
        }
    }

    /// The input gained focus.
    pub fn on_focus(&self) {
        self.core.inner().state.focused = true;
        self.core.render();
    }

    /// The input lost focus.
    pub fn on_blur(&self) {
        self.core.inner().state.focused = false;
        self.core.render();
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.core.config.name
    }

    /// Returns the field definition.
    pub fn config(&self) -> &FieldConfig {
        &self.core.config
    }

    /// Returns the current value.
    pub fn value(&self) -> String {
        self.core.inner().state.value.clone()
    }

    /// Returns the error message, whether or not it is displayed.
    pub fn error_message(&self) -> Option<String> {
        self.core.inner().state.error_message.clone()
    }

    /// Returns the error as the rendering layer would show it.
    pub fn displayed_error(&self) -> Option<String> {
        self.core.inner().state.displayed_error().map(str::to_string)
    }

    /// Returns whether the input has focus.
    pub fn is_focused(&self) -> bool {
        self.core.inner().state.focused
    }

    /// Returns the validation phase.
    pub fn phase(&self) -> FieldPhase {
        self.core.inner().phase()
    }

    /// Returns the generation of the latest issued run.
    pub fn generation(&self) -> u64 {
        self.core.inner().generation
    }

    /// Returns a snapshot of the field state.
    pub fn state(&self) -> FieldState {
        self.core.inner().state.clone()
    }

    /// Returns the field as the renderer sees it.
    pub fn view(&self) -> FieldView {
        self.core.view()
    }
}
