//! Error types for the FreeNAS share driver
//!
//! Every failure surfaced to the host framework is one of these variants.
//! Nothing in the driver retries; [`Error::action`] only tells the caller
//! whether a retry could ever succeed.

use thiserror::Error;

/// Unified error type for the driver
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Caller / Configuration Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid identifier '{identifier}': expected at least {expected_segments} '-'-separated segments")]
    InvalidIdentifier {
        identifier: String,
        expected_segments: usize,
    },

    #[error("Invalid share: {0}")]
    InvalidShare(String),

    // =========================================================================
    // Appliance Client Errors
    // =========================================================================
    #[error("Invalid username/password combination")]
    MissingCredentials,

    #[error("Invalid FREENAS command: {0}")]
    UnsupportedCommand(String),

    #[error("FREENAS api failed. Reason - {code}:{message}")]
    Appliance { code: String, message: String },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // =========================================================================
    // IO / Internal Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// What the host framework may do about an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// The appliance or the host may recover; a later call can succeed
    RetryLater,
    /// The request or configuration is wrong; retrying will fail the same way
    NoRetry,
}

impl Error {
    /// Shorthand for an appliance failure with the generic code used for
    /// non-ok outcomes
    pub fn appliance(message: impl Into<String>) -> Self {
        Error::Appliance {
            code: "Unexpected error".to_string(),
            message: message.into(),
        }
    }

    /// Determine what the caller may do about this error
    pub fn action(&self) -> ErrorAction {
        match self {
            Error::Appliance { .. } | Error::Io(_) | Error::JsonParse(_) => {
                ErrorAction::RetryLater
            }

            Error::Configuration(_)
            | Error::InvalidIdentifier { .. }
            | Error::InvalidShare(_)
            | Error::MissingCredentials
            | Error::UnsupportedCommand(_)
            | Error::YamlParse(_)
            | Error::Internal(_) => ErrorAction::NoRetry,
        }
    }

    /// Check if this error is retryable by the caller
    pub fn is_retryable(&self) -> bool {
        matches!(self.action(), ErrorAction::RetryLater)
    }
}

/// Result type alias for the driver
pub type Result<T> = std::result::Result<T, Error>;
