//! Form container and validity aggregation.
//!
//! A [`Form`] keeps a registry of field name to last reported validity and
//! tells its [`FormOwner`] when the AND over that registry flips. Fields
//! never see the registry; they talk to the form through a [`FormHandle`]
//! injected at construction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

/// Callbacks supplied by whatever embeds the form.
pub trait FormOwner: Send + Sync {
    /// Called when the form is submitted.
    fn on_submit(&self);

    /// Called when the aggregate validity becomes true.
    fn on_valid(&self);

    /// Called when the aggregate validity becomes false.
    fn on_invalid(&self);
}

type Callback = Box<dyn Fn() + Send + Sync>;

/// A [`FormOwner`] assembled from closures. Missing callbacks do nothing.
#[derive(Default)]
pub struct CallbackOwner {
    on_submit: Option<Callback>,
    on_valid: Option<Callback>,
    on_invalid: Option<Callback>,
}

impl std::fmt::Debug for CallbackOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackOwner")
            .field("on_submit", &self.on_submit.is_some())
            .field("on_valid", &self.on_valid.is_some())
            .field("on_invalid", &self.on_invalid.is_some())
            .finish()
    }
}

impl CallbackOwner {
    /// Creates an owner with no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the submit callback.
    #[must_use]
    pub fn on_submit(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_submit = Some(Box::new(f));
        self
    }

    /// Sets the valid-transition callback.
    #[must_use]
    pub fn on_valid(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_valid = Some(Box::new(f));
        self
    }

    /// Sets the invalid-transition callback.
    #[must_use]
    pub fn on_invalid(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_invalid = Some(Box::new(f));
        self
    }
}

impl FormOwner for CallbackOwner {
    fn on_submit(&self) {
        if let Some(f) = &self.on_submit {
            f();
        }
    }

    fn on_valid(&self) {
        if let Some(f) = &self.on_valid {
            f();
        }
    }

    fn on_invalid(&self) {
        if let Some(f) = &self.on_invalid {
            f();
        }
    }
}

/// Whether submission is gated on aggregate validity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmitPolicy {
    /// Always call the owner's submit handler. The rendering layer is
    /// expected to disable its submit control while the form is invalid.
    #[default]
    Always,
    /// Refuse to submit while the aggregate validity is false.
    RequireValid,
}

/// Form configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormConfig {
    /// Submission gating.
    pub submit_policy: SubmitPolicy,
}

impl FormConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the submit policy.
    #[must_use]
    pub fn submit_policy(mut self, policy: SubmitPolicy) -> Self {
        self.submit_policy = policy;
        self
    }
}

/// A submit event coming from the rendering layer.
#[derive(Debug, Clone, Default)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    /// Creates a fresh event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops the surface from running its own submission.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Returns whether the default action was prevented.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Result of [`Form::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The owner's submit handler ran.
    Submitted,
    /// The form was invalid under [`SubmitPolicy::RequireValid`].
    Blocked,
}

/// A change of aggregate validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    BecameValid,
    BecameInvalid,
}

#[derive(Debug, Default)]
struct Registry {
    fields: HashMap<String, bool>,
    valid: bool,
}

impl Registry {
    fn set(&mut self, name: &str, valid: bool) -> Option<Transition> {
        self.fields.insert(name.to_string(), valid);
        self.recompute()
    }

    fn recompute(&mut self) -> Option<Transition> {
        let valid = self.fields.values().all(|v| *v);
        let transition = match (self.valid, valid) {
            (true, false) => Some(Transition::BecameInvalid),
            (false, true) => Some(Transition::BecameValid),
            _ => None,
        };
        self.valid = valid;
        transition
    }
}

struct Shared {
    registry: Mutex<Registry>,
    /// Serializes a registry update with its owner callback, so owners see
    /// transitions in the order the registry applied them.
    notify_gate: Mutex<()>,
    owner: Arc<dyn FormOwner>,
    config: FormConfig,
}

impl Shared {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, name: &str) {
        let _gate = self.notify_gate.lock().unwrap_or_else(PoisonError::into_inner);
        let transition = {
            let mut registry = self.registry();
            if registry.fields.contains_key(name) {
                warn!(field = name, "field registered twice; resetting its validity");
            }
            registry.set(name, false)
        };
        debug!(field = name, "registered field");
        self.notify(transition);
    }

    fn report(&self, name: &str, valid: bool) {
        let _gate = self.notify_gate.lock().unwrap_or_else(PoisonError::into_inner);
        let transition = {
            let mut registry = self.registry();
            if !registry.fields.contains_key(name) {
                debug!(field = name, "report for unregistered field");
            }
            registry.set(name, valid)
        };
        debug!(field = name, valid, "field reported");
        self.notify(transition);
    }

    /// Runs owner callbacks. The notify gate must be held and the registry
    /// lock must not be.
    fn notify(&self, transition: Option<Transition>) {
        match transition {
            Some(Transition::BecameValid) => {
                info!("form became valid");
                self.owner.on_valid();
            }
            Some(Transition::BecameInvalid) => {
                info!("form became invalid");
                self.owner.on_invalid();
            }
            None => {}
        }
    }
}

/// The capability a field uses to talk to its form.
#[derive(Clone)]
pub struct FormHandle {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for FormHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormHandle").finish_non_exhaustive()
    }
}

impl FormHandle {
    /// Adds `name` to the registry as invalid.
    pub fn register(&self, name: &str) {
        self.shared.register(name);
    }

    /// Marks `name` valid.
    pub fn report_valid(&self, name: &str) {
        self.shared.report(name, true);
    }

    /// Marks `name` invalid.
    pub fn report_invalid(&self, name: &str) {
        self.shared.report(name, false);
    }
}

/// A form container aggregating the validity of its fields.
///
/// Owner callbacks run while the form holds its notify gate. They may read
/// the form but must not register or report fields.
pub struct Form {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.shared.registry();
        f.debug_struct("Form")
            .field("fields", &registry.fields)
            .field("valid", &registry.valid)
            .field("config", &self.shared.config)
            .finish()
    }
}

impl Form {
    /// Creates a form with the default configuration.
    pub fn new(owner: impl FormOwner + 'static) -> Self {
        Self::with_config(owner, FormConfig::default())
    }

    /// Creates a form with the given configuration.
    pub fn with_config(owner: impl FormOwner + 'static, config: FormConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: Mutex::new(Registry::default()),
                notify_gate: Mutex::new(()),
                owner: Arc::new(owner),
                config,
            }),
        }
    }

    /// Returns a handle to inject into fields.
    pub fn handle(&self) -> FormHandle {
        FormHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// See [`FormHandle::register`].
    pub fn register(&self, name: &str) {
        self.shared.register(name);
    }

    /// See [`FormHandle::report_valid`].
    pub fn report_valid(&self, name: &str) {
        self.shared.report(name, true);
    }

    /// See [`FormHandle::report_invalid`].
    pub fn report_invalid(&self, name: &str) {
        self.shared.report(name, false);
    }

    /// Returns the last computed aggregate validity.
    pub fn is_valid(&self) -> bool {
        self.shared.registry().valid
    }

    /// Whether the rendering layer should disable its submit control.
    pub fn submit_disabled(&self) -> bool {
        !self.is_valid()
    }

    /// Returns the last reported validity of a field.
    pub fn field_validity(&self, name: &str) -> Option<bool> {
        self.shared.registry().fields.get(name).copied()
    }

    /// Returns registered field names, sorted.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.shared.registry().fields.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the configuration.
    pub fn config(&self) -> FormConfig {
        self.shared.config
    }

    /// Handles a submit event from the rendering layer.
    pub fn submit(&self, event: &mut SubmitEvent) -> SubmitOutcome {
        event.prevent_default();

        if self.shared.config.submit_policy == SubmitPolicy::RequireValid && !self.is_valid() {
            warn!("submit blocked: form is invalid");
            return SubmitOutcome::Blocked;
        }

        info!("submitting form");
        self.shared.owner.on_submit();
        SubmitOutcome::Submitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[derive(Default)]
    struct Counts {
        submit: AtomicUsize,
        valid: AtomicUsize,
        invalid: AtomicUsize,
    }

    fn counting_form(config: FormConfig) -> (Form, Arc<Counts>) {
        let counts = Arc::new(Counts::default());
        let (s, v, i) = (counts.clone(), counts.clone(), counts.clone());
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
        (Form::with_config(owner, config), counts)
    }

    #[test]
    fn test_register_starts_invalid() {
        let (form, counts) = counting_form(FormConfig::new());
        form.register("email");
        assert_eq!(form.field_validity("email"), Some(false));
        assert!(!form.is_valid());
        assert!(form.submit_disabled());
        assert_eq!(counts.valid.load(Ordering::SeqCst), 0);
        assert_eq!(counts.invalid.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_valid_fires_once_per_transition() {
        let (form, counts) = counting_form(FormConfig::new());
        form.register("email");
        form.report_valid("email");
        form.report_valid("email");
        assert!(form.is_valid());
        assert_eq!(counts.valid.load(Ordering::SeqCst), 1);

        form.report_invalid("email");
        form.report_invalid("email");
        assert_eq!(counts.invalid.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_aggregate_is_and_of_fields() {
        let (form, counts) = counting_form(FormConfig::new());
        form.register("email");
        form.register("password");
        form.report_valid("email");
        assert!(!form.is_valid());
        form.report_valid("password");
        assert!(form.is_valid());
        assert_eq!(counts.valid.load(Ordering::SeqCst), 1);
        assert_eq!(form.field_names(), vec!["email", "password"]);
    }

    #[test]
    fn test_late_registration_invalidates() {
        let (form, counts) = counting_form(FormConfig::new());
        form.register("email");
        form.report_valid("email");
        form.register("password");
        assert!(!form.is_valid());
        assert_eq!(counts.invalid.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_duplicate_registration_resets() {
        let (form, _counts) = counting_form(FormConfig::new());
        form.register("email");
        form.report_valid("email");
        form.register("email");
        assert_eq!(form.field_validity("email"), Some(false));
        assert_eq!(form.field_names().len(), 1);
    }

    #[test]
    fn test_submit_always_ignores_validity() {
        let (form, counts) = counting_form(FormConfig::new());
        form.register("email");
        let mut event = SubmitEvent::new();
        assert_eq!(form.submit(&mut event), SubmitOutcome::Submitted);
        assert!(event.default_prevented());
        assert_eq!(counts.submit.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_submit_require_valid_blocks() {
        let config = FormConfig::new().submit_policy(SubmitPolicy::RequireValid);
        let (form, counts) = counting_form(config);
        form.register("email");

        let mut event = SubmitEvent::new();
        assert_eq!(form.submit(&mut event), SubmitOutcome::Blocked);
        assert!(event.default_prevented());
        assert_eq!(counts.submit.load(Ordering::SeqCst), 0);

        form.report_valid("email");
        assert_eq!(form.submit(&mut SubmitEvent::new()), SubmitOutcome::Submitted);
        assert_eq!(counts.submit.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handle_reports_reach_form() {
        let (form, counts) = counting_form(FormConfig::new());
        let handle = form.handle();
        handle.register("email");
        handle.report_valid("email");
        assert!(form.is_valid());
        assert_eq!(counts.valid.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_transitions_reach_owner_in_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let (v, i) = (events.clone(), events.clone());
        let owner = CallbackOwner::new()
            .on_valid(move || {
                thread::sleep(Duration::from_millis(200));
                v.lock().unwrap().push("valid");
            })
            .on_invalid(move || {
                i.lock().unwrap().push("invalid");
            });
        let form = Form::new(owner);
        form.register("a");
        form.register("b");
        form.report_valid("a");

        let first = form.handle();
        let becomes_valid = thread::spawn(move || first.report_valid("b"));
        thread::sleep(Duration::from_millis(50));
        let second = form.handle();
        let becomes_invalid = thread::spawn(move || second.report_invalid("a"));
        becomes_valid.join().unwrap();
        becomes_invalid.join().unwrap();

        assert_eq!(*events.lock().unwrap(), vec!["valid", "invalid"]);
        assert!(!form.is_valid());
    }
}
