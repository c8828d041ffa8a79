//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Nothing could be built for the requested node
    #[error("No rule for {node}: {message}")]
    NoRule {
        /// Node query as given
        node: String,
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Picker library error
    #[error("{0}")]
    Pick(#[from] rulepick::PickError),

    /// Output serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a missing-rule error
    #[must_use]
    pub fn no_rule(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NoRule {
            node: node.into(),
            message: message.into(),
        }
    }
}
