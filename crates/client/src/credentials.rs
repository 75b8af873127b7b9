//! Credential loading and validation
//!
//! The Ruten partner API authenticates every call with a triple of secrets:
//! an API key (sent in clear as `X-RT-Key`), a secret key (HMAC key) and a
//! salt key (prefix of the canonical string). All three must be present at
//! construction; a missing or blank value fails fast with a
//! [`RutenError::Config`] before any network activity.
//!
//! ## Environment Variables
//! - `RUTEN_API_KEY`: partner API key
//! - `RUTEN_SECRET_KEY`: HMAC-SHA256 signing key
//! - `RUTEN_SALT_KEY`: canonical-string salt

use ruten_domain::constants::SECRET_PREVIEW_LEN;
use ruten_domain::{Result, RutenError};

const ENV_API_KEY: &str = "RUTEN_API_KEY";
const ENV_SECRET_KEY: &str = "RUTEN_SECRET_KEY";
const ENV_SALT_KEY: &str = "RUTEN_SALT_KEY";

/// Immutable credential triple, owned by the client for its whole lifetime.
///
/// The full secret values never appear in logs; diagnostics use
/// [`Credentials::preview`]. The `Debug` implementation is redacted for the
/// same reason.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    secret_key: String,
    salt_key: String,
}

impl Credentials {
    /// Build a credential set from explicit values.
    ///
    /// # Errors
    /// Returns `RutenError::Config` if any value is empty or blank.
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        salt_key: impl Into<String>,
    ) -> Result<Self> {
        let creds = Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            salt_key: salt_key.into(),
        };

        for (name, value) in [
            ("api_key", &creds.api_key),
            ("secret_key", &creds.secret_key),
            ("salt_key", &creds.salt_key),
        ] {
            if value.trim().is_empty() {
                return Err(RutenError::Config(format!(
                    "credential field '{name}' must not be empty"
                )));
            }
        }

        Ok(creds)
    }

    /// Load credentials from the environment.
    ///
    /// A `.env` file in the working directory is honored when present
    /// (ignored otherwise).
    ///
    /// # Errors
    /// Returns `RutenError::Config` naming the first missing variable.
    pub fn from_env() -> Result<Self> {
        // Best-effort; absence of a .env file is not an error.
        let _ = dotenvy::dotenv();

        Self::new(
            required_env(ENV_API_KEY)?,
            required_env(ENV_SECRET_KEY)?,
            required_env(ENV_SALT_KEY)?,
        )
    }

    /// API key, sent in clear on every request.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// HMAC signing key.
    pub(crate) fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Canonical-string salt.
    pub(crate) fn salt_key(&self) -> &str {
        &self.salt_key
    }

    /// Safe-truncated preview of the API key for diagnostics.
    pub fn preview(&self) -> String {
        preview_of(&self.api_key)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &preview_of(&self.api_key))
            .field("secret_key", &"<redacted>")
            .field("salt_key", &"<redacted>")
            .finish()
    }
}

fn preview_of(secret: &str) -> String {
    let shown: String = secret.chars().take(SECRET_PREVIEW_LEN).collect();
    format!("{shown}…")
}

/// Get required environment variable
///
/// # Errors
/// Returns `RutenError::Config` if the variable is not set.
fn required_env(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| RutenError::Config(format!("Missing required environment variable: {key}")))
}
