use std::sync::LazyLock;

use regex::Regex;
use shared::{
    domain::{UserField, UserFields},
    error::ValidationErrors,
};
use tracing::debug;

pub const NAME_MIN_CHARS: usize = 3;

pub const REQUIRED: &str = "Required";
pub const NAME_TOO_SHORT: &str = "Too small: expected string to have >=3 characters";
pub const INVALID_EMAIL: &str = "Invalid email address";

// Leading-dot and double-dot rules are checked separately; the regex crate
// has no lookahead.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

pub fn is_valid_email(candidate: &str) -> bool {
    !candidate.starts_with('.') && !candidate.contains("..") && EMAIL_PATTERN.is_match(candidate)
}

/// Applies the field rules to a complete form value.
pub fn validate(value: &UserFields) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if value.name.is_empty() {
        errors.push(UserField::Name, REQUIRED);
    } else if value.name.chars().count() < NAME_MIN_CHARS {
        errors.push(UserField::Name, NAME_TOO_SHORT);
    }

    if !is_valid_email(&value.email) {
        errors.push(UserField::Email, INVALID_EMAIL);
    }

    if value.phone.is_empty() {
        errors.push(UserField::Phone, REQUIRED);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        debug!(%errors, "form value failed validation");
        Err(errors)
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
