//! User profile edit form: local edits overlaid on the last server snapshot,
//! derived dirty/validation state, and submit/reset against the users API.

mod form;
pub mod state;
pub mod validation;

pub use form::{FormError, FormPolicy, ProfileForm};
pub use validation::validate;
