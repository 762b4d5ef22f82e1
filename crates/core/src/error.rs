//! Validation errors reported before a request leaves the client

/// Standard result type for validation checks
pub type ValidationResult = std::result::Result<(), ValidationError>;

/// A single field failed client-side validation
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    /// Create a validation error for a field
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
