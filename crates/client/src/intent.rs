//! Per-call request descriptions
//!
//! A [`RequestIntent`] captures one logical API call before it is signed:
//! method, path, ordered query parameters and an optional structured body.
//! Intents are created fresh per call and discarded after dispatch; they are
//! never cached, so every call gets its own timestamp and signature.

use reqwest::Method;
use ruten_domain::{Result, RutenError};

/// One logical API call, pre-signing.
#[derive(Debug, Clone)]
pub struct RequestIntent {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl RequestIntent {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: None }
    }

    /// GET intent for `path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// POST intent for `path`.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// PUT intent for `path`.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// DELETE intent for `path`.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter. Order is preserved: the serialized query
    /// string is deterministic for a fixed call sequence, which the signature
    /// relies on.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Attach a structured JSON body.
    #[must_use]
    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// HTTP method of this intent.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path (no query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Ordered query parameters.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Serialize the body to the exact string that will be both signed and
    /// transmitted. Compact (no extraneous whitespace); JSON objects use
    /// `serde_json`'s sorted map keys, so the serialization is stable.
    /// Returns the empty string for body-less intents (e.g. GET).
    ///
    /// # Errors
    /// Returns `RutenError::Internal` if the value cannot be serialized.
    pub fn body_string(&self) -> Result<String> {
        match &self.body {
            None => Ok(String::new()),
            Some(value) => serde_json::to_string(value)
                .map_err(|e| RutenError::Internal(format!("failed to serialize request body: {e}"))),
        }
    }
}
