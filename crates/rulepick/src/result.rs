//! Result and error types for rulepick.
//!
//! Picking and rule construction never fail; these errors only surface at the
//! edges where configuration or page snapshots are read.

use thiserror::Error;

/// Result type for rulepick operations
pub type PickResult<T> = Result<T, PickError>;

/// Errors that can occur while loading configuration or page snapshots
#[derive(Debug, Error)]
pub enum PickError {
    /// Configuration could not be parsed or is inconsistent
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// Page snapshot could not be turned into a document
    #[error("Invalid page snapshot: {message}")]
    InvalidSnapshot {
        /// Error message
        message: String,
    },

    /// A node query did not resolve to an element
    #[error("No element matches {query:?}")]
    NodeNotFound {
        /// The query that failed
        query: String,
    },

    /// Selector uses syntax the headless matcher does not understand
    #[error("Unsupported selector {selector:?}: {message}")]
    UnsupportedSelector {
        /// Selector text
        selector: String,
        /// What went wrong
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl PickError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a snapshot error
    #[must_use]
    pub fn snapshot(message: impl Into<String>) -> Self {
        Self::InvalidSnapshot {
            message: message.into(),
        }
    }

    /// Create a lookup error
    #[must_use]
    pub fn not_found(query: impl Into<String>) -> Self {
        Self::NodeNotFound {
            query: query.into(),
        }
    }

    /// Create a selector error
    #[must_use]
    pub fn selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnsupportedSelector {
            selector: selector.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PickError::config("border_width must be positive").to_string(),
            "Invalid configuration: border_width must be positive"
        );
        assert_eq!(
            PickError::not_found("#ad1").to_string(),
            "No element matches \"#ad1\""
        );
    }

    #[test]
    fn test_json_error_converts() {
        let err: PickError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, PickError::Json(_)));
    }
}
