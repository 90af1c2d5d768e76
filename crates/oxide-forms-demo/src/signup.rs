//! The sign-up form: an email and a password.

use std::sync::Arc;
use std::time::Duration;

use oxide_live_forms::{
    Field, FieldConfig, FieldRenderer, Form, FormConfig, FormOwner, InputKind, Result, Validator,
    ValidatorFault,
};

/// Knobs for the sign-up form.
#[derive(Debug, Clone)]
pub struct SignupConfig {
    /// Address the fake uniqueness check rejects.
    pub taken_email: String,
    /// Simulated latency of the uniqueness check.
    pub lookup_latency: Duration,
    /// Minimum password length.
    pub min_password: usize,
    /// Form configuration.
    pub form: FormConfig,
}

impl Default for SignupConfig {
    fn default() -> Self {
        Self {
            taken_email: "harry@example.com".to_string(),
            lookup_latency: Duration::from_millis(200),
            min_password: 8,
            form: FormConfig::default(),
        }
    }
}

/// A built form together with its fields.
#[derive(Debug)]
pub struct Signup {
    pub form: Form,
    pub fields: Vec<Field>,
}

impl Signup {
    /// Builds the form and mounts its fields.
    pub fn build(
        config: &SignupConfig,
        owner: impl FormOwner + 'static,
        renderer: Arc<dyn FieldRenderer>,
    ) -> Result<Self> {
        let form = Form::with_config(owner, config.form);

        let taken = config.taken_email.clone();
        let latency = config.lookup_latency;
        let unique = Validator::from_async(
            "unique_email",
            "Email address is already taken.",
            move |email| {
                let taken = taken.clone();
                async move {
                    tokio::time::sleep(latency).await;
                    Ok::<_, ValidatorFault>(email != taken)
                }
            },
        );

        let email = FieldConfig::new("email", "Email")
            .validator(Validator::pattern("@", "Invalid email address")?)
            .validator(unique);

        let password = FieldConfig::new("password", "Password")
            .kind(InputKind::Password)
            .validator(
                Validator::min_length(config.min_password)
                    .with_message(format!("Minimum {} characters.", config.min_password)),
            );

        let fields = vec![
            Field::new(email, form.handle(), Arc::clone(&renderer))?,
            Field::new(password, form.handle(), renderer)?,
        ];

        Ok(Self { form, fields })
    }

    /// Looks a field up by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Field values keyed by name.
    pub fn values(&self) -> serde_json::Map<String, serde_json::Value> {
        self.fields
            .iter()
            .map(|f| (f.name().to_string(), serde_json::Value::String(f.value())))
            .collect()
    }
}
