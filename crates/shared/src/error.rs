use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::UserField;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    Internal,
}

/// JSON error body returned by the users backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOperation {
    Create,
    List,
    Fetch,
    Update,
    Delete,
}

impl RemoteOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            RemoteOperation::Create => "create user",
            RemoteOperation::List => "fetch users",
            RemoteOperation::Fetch => "fetch user",
            RemoteOperation::Update => "update user",
            RemoteOperation::Delete => "delete user",
        }
    }
}

impl fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backend call failed: non-success status, or the round trip itself
/// broke. 4xx and 5xx are not distinguished and the body is never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to {operation}: {message}")]
pub struct RemoteError {
    pub operation: RemoteOperation,
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn new(operation: RemoteOperation, message: impl Into<String>) -> Self {
        Self {
            operation,
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(operation: RemoteOperation, status: u16) -> Self {
        Self {
            operation,
            status: Some(status),
            message: format!("server responded with status {status}"),
        }
    }
}

/// Per-field rule violations, each list non-empty and in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    fields: BTreeMap<UserField, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: UserField, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, field: UserField) -> &[String] {
        self.fields.get(&field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has(&self, field: UserField) -> bool {
        self.fields.contains_key(&field)
    }

    /// Messages for one field joined the way the form renders them.
    pub fn joined(&self, field: UserField) -> String {
        self.field(field).join(", ")
    }

    pub fn iter(&self) -> impl Iterator<Item = (UserField, &[String])> + '_ {
        self.fields
            .iter()
            .map(|(field, messages)| (*field, messages.as_slice()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{field}: {}", messages.join(", "))?;
        }
        Ok(())
    }
}
