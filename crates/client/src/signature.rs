//! HMAC-SHA256 request signing
//!
//! The upstream verifies every call against a canonical string of the form
//! `salt_key ++ canonical_path ++ body ++ timestamp`, where `canonical_path`
//! is the request path with the URL-encoded query string folded in. The exact
//! same path+query string is used on the wire, so the signed bytes always
//! match the transmitted bytes.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use ruten_domain::constants::{HEADER_API_KEY, HEADER_SIGNATURE, HEADER_TIMESTAMP, USER_AGENT};

use crate::credentials::Credentials;

type HmacSha256 = Hmac<Sha256>;

/// Canonical string and the timestamp it was computed against. Ephemeral:
/// exists only for the duration of one request.
#[derive(Debug, Clone)]
pub struct SignaturePayload {
    /// Exact byte sequence the digest is computed over.
    pub canonical_string: String,
    /// Unix epoch seconds, string form; identical to the transmitted header.
    pub timestamp: String,
    /// Lowercase hex HMAC-SHA256 digest of `canonical_string`.
    pub digest: String,
}

/// Headers derived from one [`SignaturePayload`].
#[derive(Debug, Clone)]
pub struct AuthHeaders {
    /// `X-RT-Key` value.
    pub api_key: String,
    /// `X-RT-Timestamp` value, identical to the signed timestamp.
    pub timestamp: String,
    /// `X-RT-Authorization` value.
    pub signature: String,
    /// Fixed client identifier.
    pub user_agent: &'static str,
    /// `Content-Type` for the request.
    pub content_type: &'static str,
}

impl AuthHeaders {
    /// Derive the header set for one signed request.
    pub fn build(credentials: &Credentials, payload: &SignaturePayload) -> Self {
        Self {
            api_key: credentials.api_key().to_string(),
            timestamp: payload.timestamp.clone(),
            signature: payload.digest.clone(),
            user_agent: USER_AGENT,
            content_type: "application/json",
        }
    }

    /// Header names paired with values, ready to apply to a request builder.
    pub fn as_pairs(&self) -> [(&'static str, &str); 3] {
        [
            (HEADER_API_KEY, self.api_key.as_str()),
            (HEADER_TIMESTAMP, self.timestamp.as_str()),
            (HEADER_SIGNATURE, self.signature.as_str()),
        ]
    }
}

/// URL-encode query pairs into `k=v&k=v` form, preserving pair order.
pub fn canonical_query(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Path with the canonical query folded in. This exact string is signed and
/// then used as the request URL's path+query.
pub fn canonical_path(path: &str, pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, canonical_query(pairs))
    }
}

/// Sign one request.
///
/// `timestamp` must come from a single clock read per call; the same value
/// goes into the canonical string and the `X-RT-Timestamp` header.
pub fn sign(
    credentials: &Credentials,
    canonical_path: &str,
    body: &str,
    timestamp: &str,
) -> SignaturePayload {
    let canonical_string =
        format!("{}{}{}{}", credentials.salt_key(), canonical_path, body, timestamp);
    let digest = hmac_sha256_hex(credentials.secret_key(), &canonical_string);

    SignaturePayload { canonical_string, timestamp: timestamp.to_string(), digest }
}

fn hmac_sha256_hex(key: &str, message: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
