use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Represents an error response.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, ToSchema)]
pub struct ErrorResponse {
    /// The main error message
    pub message: String,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Creates a new error response with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new error response with message and details.
    pub fn with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Some(details.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_no_details() {
        let error = ErrorResponse::new("conversation not found");

        assert_eq!(error.message, "conversation not found");
        assert!(error.details.is_none());
    }

    #[test]
    fn test_with_details() {
        let error = ErrorResponse::with_details("validation failed", "content must not be blank");

        assert_eq!(error.message, "validation failed");
        assert_eq!(error.details.as_deref(), Some("content must not be blank"));
    }
}
