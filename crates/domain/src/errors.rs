//! Error types used throughout the client

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the Ruten client.
///
/// Only client construction and request *preparation* surface these errors.
/// Once a request reaches the dispatcher, every outcome (transport failure,
/// upstream rejection, malformed body) is normalized into an
/// [`crate::types::ApiResult`] value instead of being raised.
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum RutenError {
    /// Missing or invalid credentials/configuration at construction time.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller-supplied input rejected before any network activity.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Network-level failure outside the normalized dispatch path
    /// (e.g. the clock-skew probe).
    #[error("Network error: {0}")]
    Network(String),

    /// Invariant violation inside the client itself.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Ruten client operations
pub type Result<T> = std::result::Result<T, RutenError>;
