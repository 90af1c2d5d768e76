//! Field validators.
//!
//! A [`Validator`] pairs a predicate with a fixed failure message. The
//! predicate may answer immediately or hand back a future; either way the
//! field controller sees a [`Verdict`] future and joins all of them before
//! deciding.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, LazyLock};

use futures::future::{self, BoxFuture};
use regex::Regex;

use crate::error::{Result, ValidatorFault};

/// The eventual answer of a predicate: `Ok(true)` when the value passes.
pub type Verdict = BoxFuture<'static, std::result::Result<bool, ValidatorFault>>;

type Predicate = dyn Fn(&str) -> Verdict + Send + Sync;

/// A named rule applied to a field's value.
#[derive(Clone)]
pub struct Validator {
    name: String,
    message: String,
    predicate: Arc<Predicate>,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("name", &self.name)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl Validator {
    /// Creates a validator from a synchronous predicate.
    pub fn new<F>(name: impl Into<String>, message: impl Into<String>, check: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            message: message.into(),
            predicate: Arc::new(move |value: &str| -> Verdict {
                Box::pin(future::ready(Ok(check(value))))
            }),
        }
    }

    /// Creates a validator whose predicate resolves later.
    ///
    /// The closure receives an owned copy of the value so the returned
    /// future can outlive the call. Returning `Err` marks a fault, not a
    /// failed check.
    pub fn from_async<F, Fut>(
        name: impl Into<String>,
        message: impl Into<String>,
        check: F,
    ) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<bool, ValidatorFault>> + Send + 'static,
    {
        Self {
            name: name.into(),
            message: message.into(),
            predicate: Arc::new(move |value: &str| -> Verdict {
                Box::pin(check(value.to_string()))
            }),
        }
    }

    /// Replaces the failure message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Returns the validator name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the failure message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Starts checking `value`.
    pub fn check(&self, value: &str) -> Verdict {
        (self.predicate)(value)
    }

    /// Requires a non-blank value.
    pub fn required() -> Self {
        Self::new("required", "This field is required.", |value| {
            !value.trim().is_empty()
        })
    }

    /// Requires at least `min_length` characters.
    pub fn min_length(min_length: usize) -> Self {
        Self::new(
            "min_length",
            format!("Ensure this value has at least {min_length} characters."),
            move |value| value.chars().count() >= min_length,
        )
    }

    /// Allows at most `max_length` characters.
    pub fn max_length(max_length: usize) -> Self {
        Self::new(
            "max_length",
            format!("Ensure this value has at most {max_length} characters."),
            move |value| value.chars().count() <= max_length,
        )
    }

    /// Requires something shaped like an email address.
    pub fn email() -> Self {
        Self::new("email", "Enter a valid email address.", |value| {
            EMAIL_REGEX.is_match(value)
        })
    }

    /// Requires an http(s) URL.
    pub fn url() -> Self {
        Self::new("url", "Enter a valid URL.", |value| {
            value.starts_with("http://") || value.starts_with("https://")
        })
    }

    /// Requires the value to match `pattern` somewhere.
    pub fn pattern(pattern: &str, message: impl Into<String>) -> Result<Self> {
        let regex = Regex::new(pattern)?;
        Ok(Self::new("pattern", message, move |value| regex.is_match(value)))
    }

    /// Requires a number within the given bounds.
    ///
    /// Values that do not parse as numbers fail with the same message.
    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        let message = match (min, max) {
            (Some(min), Some(max)) => format!("Value must be between {min} and {max}."),
            (Some(min), None) => format!("Value must be at least {min}."),
            (None, Some(max)) => format!("Value must be at most {max}."),
            (None, None) => "Enter a valid number.".to_string(),
        };
        Self::new("range", message, move |value| {
            let Ok(num) = value.trim().parse::<f64>() else {
                return false;
            };
            min.is_none_or(|min| num >= min) && max.is_none_or(|max| num <= max)
        })
    }
}

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

/// The first failing validator of a run, if any.
///
/// `results` must be in the same order as `validators`.
pub(crate) fn first_failure<'a>(
    validators: &'a [Validator],
    results: &[bool],
) -> Option<&'a Validator> {
    validators
        .iter()
        .zip(results)
        .find_map(|(validator, passed)| (!passed).then_some(validator))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn passes(validator: &Validator, value: &str) -> bool {
        validator.check(value).await.unwrap()
    }

    #[tokio::test]
    async fn test_required_validator() {
        let v = Validator::required();
        assert!(passes(&v, "hello").await);
        assert!(!passes(&v, "").await);
        assert!(!passes(&v, "   ").await);
    }

    #[tokio::test]
    async fn test_length_validators() {
        let min = Validator::min_length(8);
        assert!(passes(&min, "longenough").await);
        assert!(!passes(&min, "short").await);

        let max = Validator::max_length(5);
        assert!(passes(&max, "hello").await);
        assert!(!passes(&max, "hello world").await);
    }

    #[tokio::test]
    async fn test_email_validator() {
        let v = Validator::email();
        assert!(passes(&v, "user@example.com").await);
        assert!(passes(&v, "user.name@domain.co.uk").await);
        assert!(!passes(&v, "invalid").await);
        assert!(!passes(&v, "@example.com").await);
    }

    #[tokio::test]
    async fn test_url_validator() {
        let v = Validator::url();
        assert!(passes(&v, "https://example.com").await);
        assert!(!passes(&v, "example.com").await);
    }

    #[tokio::test]
    async fn test_pattern_validator() {
        let v = Validator::pattern("@", "Invalid email address").unwrap();
        assert_eq!(v.message(), "Invalid email address");
        assert!(passes(&v, "harry@example.com").await);
        assert!(!passes(&v, "harry").await);
        assert!(Validator::pattern("(", "broken").is_err());
    }

    #[tokio::test]
    async fn test_range_validator() {
        let v = Validator::range(Some(0.0), Some(100.0));
        assert!(passes(&v, "50").await);
        assert!(passes(&v, "100").await);
        assert!(!passes(&v, "-1").await);
        assert!(!passes(&v, "abc").await);
    }

    #[tokio::test]
    async fn test_async_validator_and_fault() {
        let taken = Validator::from_async(
            "unique",
            "Email address is already taken.",
            |value| async move { Ok::<_, ValidatorFault>(value != "harry@example.com") },
        );
        assert!(passes(&taken, "sally@example.com").await);
        assert!(!passes(&taken, "harry@example.com").await);

        let broken = Validator::from_async("lookup", "unused", |_value| async move {
            Err::<bool, _>(ValidatorFault::new("backend down"))
        });
        assert_eq!(
            broken.check("x").await,
            Err(ValidatorFault::new("backend down"))
        );
    }

    #[test]
    fn test_first_failure_uses_declaration_order() {
        let validators = vec![
            Validator::required(),
            Validator::min_length(8),
            Validator::email(),
        ];
        let failed = first_failure(&validators, &[true, false, false]).unwrap();
        assert_eq!(failed.name(), "min_length");
        assert!(first_failure(&validators, &[true, true, true]).is_none());
    }

    #[test]
    fn test_with_message() {
        let v = Validator::min_length(8).with_message("Minimum 8 characters.");
        assert_eq!(v.message(), "Minimum 8 characters.");
        assert_eq!(v.name(), "min_length");
    }
}
