//! Normalized request outcomes returned to callers.
//!
//! Every dispatched call produces exactly one [`ApiResult`], regardless of
//! whether the failure happened at the transport layer, in the upstream
//! application, or while parsing the response body. Callers (a web layer or
//! CLI) decide status mapping; nothing here is raised as an error.

use serde::{Deserialize, Serialize};

/// Sentinel placed in [`ApiError::error_code`] / [`ApiError::error_message`]
/// when an upstream error response carried a body that is not machine-readable
/// (e.g. an HTML error page). Distinguishes "detail could not be extracted"
/// from "upstream sent no detail".
pub const UNPARSEABLE_DETAIL: &str = "unparseable";

/// Sentinel in [`ApiError::error_code`] for a 2xx response whose body failed
/// to parse as JSON. Callers must not mistake this for a valid empty success.
pub const NON_JSON_RESPONSE: &str = "non_json_response";

/// Outcome of one dispatched API call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApiResult {
    /// Upstream returned 2xx with a parseable JSON body.
    Success {
        /// HTTP status code of the response.
        status_code: u16,
        /// Parsed response body, as the upstream sent it.
        body: serde_json::Value,
    },
    /// Anything else: transport failure, non-2xx status, or malformed body.
    Error(ApiError),
}

impl ApiResult {
    /// Whether this result is the success variant.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Error detail, if this result is the error variant.
    pub fn as_error(&self) -> Option<&ApiError> {
        match self {
            Self::Error(err) => Some(err),
            Self::Success { .. } => None,
        }
    }
}

/// Normalized failure detail for a dispatched call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiError {
    /// HTTP status code, when a response was received at all.
    pub status_code: Option<u16>,
    /// Human-readable description of what went wrong at the transport/HTTP
    /// level.
    pub transport_message: Option<String>,
    /// Upstream application error code, extracted from a JSON error body;
    /// [`UNPARSEABLE_DETAIL`] when the body was not machine-readable.
    pub error_code: Option<String>,
    /// Upstream application error message; same sentinel rules as
    /// [`ApiError::error_code`].
    pub error_message: Option<String>,
    /// Raw response body, preserved for diagnosis.
    pub raw_body: Option<String>,
}

impl ApiError {
    /// Transport-level failure (connection refused, timeout, DNS): no
    /// response was received, so no status code or body is available.
    pub fn transport(message: impl Into<String>) -> Self {
        Self { transport_message: Some(message.into()), ..Self::default() }
    }

    /// Non-2xx response whose body yielded upstream error detail.
    pub fn upstream(
        status_code: u16,
        transport_message: impl Into<String>,
        error_code: Option<String>,
        error_message: Option<String>,
        raw_body: Option<String>,
    ) -> Self {
        Self {
            status_code: Some(status_code),
            transport_message: Some(transport_message.into()),
            error_code,
            error_message,
            raw_body,
        }
    }

    /// Non-2xx response whose body is not machine-readable: detail fields
    /// carry the explicit [`UNPARSEABLE_DETAIL`] sentinel rather than being
    /// left absent.
    pub fn unparseable(status_code: u16, transport_message: impl Into<String>, raw_body: Option<String>) -> Self {
        Self {
            status_code: Some(status_code),
            transport_message: Some(transport_message.into()),
            error_code: Some(UNPARSEABLE_DETAIL.to_string()),
            error_message: Some(UNPARSEABLE_DETAIL.to_string()),
            raw_body,
        }
    }

    /// 2xx response whose body failed JSON parsing.
    pub fn malformed_success(status_code: u16, raw_body: Option<String>) -> Self {
        Self {
            status_code: Some(status_code),
            transport_message: Some("2xx response body was not valid JSON".to_string()),
            error_code: Some(NON_JSON_RESPONSE.to_string()),
            error_message: Some(NON_JSON_RESPONSE.to_string()),
            raw_body,
        }
    }

    /// Caller input rejected before dispatch; no network call was made.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            transport_message: Some(message.clone()),
            error_code: Some("invalid_input".to_string()),
            error_message: Some(message),
            ..Self::default()
        }
    }

    /// Best human-readable summary of this error.
    pub fn summary(&self) -> String {
        match (&self.error_message, &self.transport_message) {
            (Some(detail), _) if detail != UNPARSEABLE_DETAIL => detail.clone(),
            (_, Some(transport)) => transport.clone(),
            _ => "unknown error".to_string(),
        }
    }
}

/// Result of a credential verification probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialCheck {
    /// Whether the credential triple was accepted by the upstream.
    pub valid: bool,
    /// Human-readable explanation, carrying upstream detail on failure.
    pub message: String,
}

/// Advisory comparison between the local clock and a trusted time source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SkewReport {
    /// Absolute difference between local and trusted time, in seconds.
    pub difference_seconds: i64,
    /// Whether the difference is inside the accepted tolerance.
    pub within_tolerance: bool,
}
