//! Plain-text views of records and form sessions.

use std::fmt::Write as _;

use profile_form::ProfileForm;
use shared::{
    domain::{UserField, UserFields, UserRecord},
    error::ValidationErrors,
    protocol::UserPatch,
};

pub fn render_record(record: &UserRecord) -> String {
    format!(
        "{}  {} <{}> {}",
        record.id, record.name, record.email, record.phone
    )
}

/// One line per field; edited fields are starred and followed by their
/// violations, if any.
pub fn render_fields(
    value: &UserFields,
    overlay: &UserPatch,
    errors: Option<&ValidationErrors>,
) -> String {
    let mut out = String::new();
    for field in UserField::ALL {
        let marker = if overlay.get(field).is_some() { "*" } else { " " };
        let _ = write!(out, "{marker} {:<6} {}", field.as_str(), value.get(field));
        if let Some(messages) = errors.map(|e| e.joined(field)).filter(|m| !m.is_empty()) {
            let _ = write!(out, "  ! {messages}");
        }
        out.push('\n');
    }
    out
}

pub fn render_form(form: &ProfileForm) -> String {
    let errors = form.validate().err();
    let mut out = render_fields(&form.effective_value(), form.overlay(), errors.as_ref());
    let _ = writeln!(
        out,
        "dirty: {}  valid: {}",
        form.is_dirty(),
        errors.is_none()
    );
    out
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
