//! The rendering seam.
//!
//! Fields push a [`FieldView`] to their [`FieldRenderer`] after every state
//! change. The view already has the focus rule applied: `error` is `None`
//! while the input is focused.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use ironhtml::html;
use ironhtml_elements::Div;
use serde::Serialize;

use crate::field::{FieldPhase, InputKind};

/// What the rendering layer needs to draw one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    /// Field name.
    pub name: String,
    /// Field label.
    pub label: String,
    /// Input kind.
    pub kind: InputKind,
    /// Current raw value.
    pub value: String,
    /// Error to display, if any.
    pub error: Option<String>,
    /// Validation phase.
    pub phase: FieldPhase,
}

/// Draws a field. Called with the lock on field state released.
pub trait FieldRenderer: Send + Sync {
    /// Renders the field in its current state.
    fn render(&self, view: &FieldView);
}

impl<F> FieldRenderer for F
where
    F: Fn(&FieldView) + Send + Sync,
{
    fn render(&self, view: &FieldView) {
        self(view);
    }
}

/// A renderer that draws nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRenderer;

impl FieldRenderer for NoopRenderer {
    fn render(&self, _view: &FieldView) {}
}

/// Renders fields to HTML and keeps the latest markup per field.
#[derive(Debug, Default)]
pub struct HtmlFieldRenderer {
    markup: Mutex<HashMap<String, String>>,
}

impl HtmlFieldRenderer {
    /// Creates an empty renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last markup rendered for `name`.
    pub fn markup(&self, name: &str) -> Option<String> {
        self.markup
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}

impl FieldRenderer for HtmlFieldRenderer {
    fn render(&self, view: &FieldView) {
        let html = render_field_html(view);
        self.markup
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(view.name.clone(), html);
    }
}

/// Renders a field as an input nested in its label, followed by its error,
/// if shown.
pub fn render_field_html(view: &FieldView) -> String {
    let id = format!("id_{}", view.name);
    let label_text = view.label.clone();
    let input = format!(
        r#"<input type="{}" id="{}" name="{}" value="{}">"#,
        view.kind.as_str(),
        html_escape(&id),
        html_escape(&view.name),
        html_escape(&view.value)
    );

    let label_el = html! {
        label.for_(#id) { #label_text }
    };

    let error = view.error.clone();

    html! { div.class("field") }
        .raw(label_el.raw(&input).render())
        .when(error.is_some(), |d| {
            d.child::<Div, _>(|e| e.class("field--error").text(error.as_deref().unwrap_or("")))
        })
        .render()
}

/// Escapes HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
