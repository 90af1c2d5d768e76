//! # oxide-live-forms
//!
//! Form validity tracking with synchronous and asynchronous field validators.
//!
//! This crate provides:
//! - Validators pairing a predicate with a fixed failure message
//! - A field controller that validates on every change
//! - A form container that aggregates field validity
//! - A rendering seam with an HTML renderer
//!
//! ## Quick Start
//!
//! ```rust
//! use oxide_live_forms::{CallbackOwner, Field, FieldConfig, Form, InputKind, Validator};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> oxide_live_forms::Result<()> {
//! let form = Form::new(
//!     CallbackOwner::new()
//!         .on_valid(|| println!("form is valid"))
//!         .on_invalid(|| println!("form is invalid")),
//! );
//!
//! let email = Field::headless(
//!     FieldConfig::new("email", "Email")
//!         .kind(InputKind::Email)
//!         .validator(Validator::pattern("@", "Invalid email address")?),
//!     form.handle(),
//! )?;
//!
//! email.on_change("harry")?.outcome().await?;
//! assert_eq!(email.error_message().as_deref(), Some("Invalid email address"));
//!
//! email.on_change("harry@example.com")?.outcome().await?;
//! assert!(form.is_valid());
//! # Ok(())
//! # }
//! ```
//!
//! ## Asynchronous validators
//!
//! ```rust
//! use std::time::Duration;
//! use oxide_live_forms::{Validator, ValidatorFault};
//!
//! let taken = Validator::from_async(
//!     "unique_email",
//!     "Email address is already taken.",
//!     |email| async move {
//!         tokio::time::sleep(Duration::from_millis(200)).await;
//!         Ok::<_, ValidatorFault>(email != "harry@example.com")
//!     },
//! );
//! assert_eq!(taken.message(), "Email address is already taken.");
//! ```
//!
//! ## Overlapping runs
//!
//! Every change issues a new run. A run that completes after a newer run was
//! issued is discarded, so the latest input always decides the field state.

mod error;
pub mod field;
pub mod form;
pub mod render;
pub mod validation;

pub use error::{FormError, Result, ValidatorFault};
pub use field::{Field, FieldConfig, FieldPhase, FieldState, InputKind, RunOutcome, ValidationRun};
pub use form::{
    CallbackOwner, Form, FormConfig, FormHandle, FormOwner, SubmitEvent, SubmitOutcome,
    SubmitPolicy,
};
pub use render::{FieldRenderer, FieldView, HtmlFieldRenderer, NoopRenderer};
pub use validation::{Validator, Verdict};
