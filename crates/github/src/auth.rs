//! GitHub App authentication.
//!
//! App-level endpoints (listing installations, minting installation tokens)
//! require a short-lived RS256 JWT signed with the app's private key. All
//! repository operations then use the installation access token.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;

use crate::GithubError;

/// GitHub rejects app tokens valid for longer than ten minutes.
const TOKEN_LIFETIME_SECS: i64 = 10 * 60;

/// Backdates `iat` to tolerate clock drift between us and GitHub.
const CLOCK_DRIFT_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppClaims {
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl AppClaims {
    /// Claims backdated for clock drift and expiring ten minutes after `now`.
    pub fn issued_at(app_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            iat: (now - Duration::seconds(CLOCK_DRIFT_SECS)).timestamp(),
            exp: (now + Duration::seconds(TOKEN_LIFETIME_SECS)).timestamp(),
            iss: app_id.to_string(),
        }
    }
}

/// Identity of the GitHub App: its id and the key it signs tokens with.
#[derive(Clone)]
pub struct AppCredentials {
    app_id: String,
    key: EncodingKey,
}

impl AppCredentials {
    /// Parses a PEM-encoded RSA private key.
    pub fn new(app_id: impl Into<String>, private_key_pem: &str) -> Result<Self, GithubError> {
        Ok(Self {
            app_id: app_id.into(),
            key: EncodingKey::from_rsa_pem(private_key_pem.as_bytes())?,
        })
    }

    /// Numeric app id, as a string.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Signs an app token valid from `now` for ten minutes.
    pub fn jwt(&self, now: DateTime<Utc>) -> Result<String, GithubError> {
        let claims = AppClaims::issued_at(&self.app_id, now);
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.key,
        )?)
    }
}

impl std::fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCredentials")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}
