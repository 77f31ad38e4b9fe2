// List controller error types
use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::collection::CollectionError;
use crate::database::manager::DatabaseError;

/// Field-scoped validation failure raised before any request is issued
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub field_errors: HashMap<String, String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_errors: HashMap::new(),
        }
    }

    /// Error for a single field
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new("Missing required fields");
        err.field_errors.insert(field.into(), message.into());
        err
    }

    /// Message shown next to `field`, if any
    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.field_errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Collects required-field checks for one form
#[derive(Debug, Default)]
pub struct RequiredFields {
    missing: HashMap<String, String>,
}

impl RequiredFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags `field` when the value is empty or whitespace
    pub fn require(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.missing
                .insert(field.to_string(), "This field is required".to_string());
        }
        self
    }

    /// Like `require`, but only checks values that are present (partial edits)
    pub fn require_if_present(self, field: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.require(field, v),
            None => self,
        }
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        ValidationError {
            message: "Missing required fields".to_string(),
            field_errors: self.missing,
        }
        .into_result()
    }
}

/// Errors returned by list controller operations.
///
/// By the time one of these reaches the caller the local list has already been
/// settled (left unchanged or rolled back) and a notice has been emitted where
/// applicable; callers only need it for form state or exit codes.
#[derive(Debug, Error)]
pub enum ListError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{label} {id} not found")]
    NotFound { label: &'static str, id: Uuid },

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error("Delete requires confirmation")]
    ConfirmationRequired,

    #[error("A {0} request is already in progress")]
    Busy(&'static str),

    #[error("Remote request failed: {0}")]
    Remote(#[from] DatabaseError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ListError {
    /// Stable error code for CLI/JSON output
    pub fn error_code(&self) -> &'static str {
        match self {
            ListError::Validation(_) => "VALIDATION_ERROR",
            ListError::NotFound { .. } => "NOT_FOUND",
            ListError::Collection(_) => "BAD_REQUEST",
            ListError::ConfirmationRequired => "CONFIRMATION_REQUIRED",
            ListError::Busy(_) => "CONFLICT",
            ListError::Remote(_) => "REMOTE_ERROR",
            ListError::Auth(_) => "FORBIDDEN",
        }
    }

    /// Field errors for form rendering
    pub fn field_errors(&self) -> Option<&HashMap<String, String>> {
        match self {
            ListError::Validation(v) => Some(&v.field_errors),
            _ => None,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ListError::Remote(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_fields_flags_blank_values() {
        let err = RequiredFields::new()
            .require("title", "   ")
            .require("content", "body")
            .finish()
            .unwrap_err();

        assert_eq!(err.for_field("title"), Some("This field is required"));
        assert!(err.for_field("content").is_none());
    }

    #[test]
    fn required_fields_skips_absent_partial_values() {
        assert!(RequiredFields::new()
            .require_if_present("title", None)
            .finish()
            .is_ok());
        assert!(RequiredFields::new()
            .require_if_present("title", Some(""))
            .finish()
            .is_err());
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(ListError::ConfirmationRequired.error_code(), "CONFIRMATION_REQUIRED");
        assert_eq!(ListError::Busy("save").error_code(), "CONFLICT");
        let remote = ListError::from(DatabaseError::QueryError("boom".into()));
        assert!(remote.is_remote());
    }
}
