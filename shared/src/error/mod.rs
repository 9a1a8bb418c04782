//! Unified error system for the catalog view
//!
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`ErrorBody`]: Serializable error payload for the presentation layer
//!
//! # Example
//!
//! ```
//! use shared::error::{ErrorBody, ErrorCategory, ErrorCode};
//!
//! let body = ErrorBody::new(ErrorCode::InvalidPriceRange);
//! assert_eq!(body.code.category(), ErrorCategory::Criteria);
//!
//! let body = ErrorBody::with_message(ErrorCode::FetchFailed, "p1: timeout");
//! assert_eq!(body.message, "p1: timeout");
//! ```

mod category;
mod codes;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};

use serde::{Deserialize, Serialize};

/// Error payload handed to whoever renders catalog results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorBody {
    /// Create a body with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.message().to_string(),
        }
    }

    /// Create a body with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_serialize() {
        let body = ErrorBody::new(ErrorCode::CatalogNotLoaded);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], 4003);
        assert_eq!(json["message"], "Catalog has not been loaded");
    }
}
