//! GitHub adapter errors and their mapping onto [`articles::HostError`].

use articles::HostError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GithubError {
    /// GitHub answered with a non-success status.
    #[error("GitHub returned {status} for {resource}: {message}")]
    Api {
        status: u16,
        resource: String,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Could not sign app token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid API URL '{0}'")]
    InvalidUrl(String),

    #[error("Unexpected response: {0}")]
    Unexpected(String),
}

impl GithubError {
    /// Builds an [`GithubError::Api`] from a failed response body.
    ///
    /// GitHub error bodies are JSON objects with a `message` field; anything
    /// else is passed through as-is.
    pub fn from_response(status: u16, resource: impl Into<String>, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or_else(|| body.trim().to_string());
        Self::Api {
            status,
            resource: resource.into(),
            message,
        }
    }
}

impl From<GithubError> for HostError {
    fn from(err: GithubError) -> Self {
        match err {
            GithubError::Api {
                status,
                resource,
                message,
            } => match status {
                404 => HostError::NotFound { resource },
                409 | 422 => HostError::Conflict { message },
                410 => HostError::Unavailable { message },
                401 | 403 => HostError::Unauthorized { message },
                _ => HostError::Rejected { status, message },
            },
            GithubError::Http(e) if e.is_decode() => HostError::InvalidResponse {
                message: e.to_string(),
            },
            GithubError::Http(e) => HostError::Transport {
                message: e.to_string(),
            },
            GithubError::Jwt(e) => HostError::Unauthorized {
                message: e.to_string(),
            },
            GithubError::InvalidUrl(url) => HostError::InvalidResponse {
                message: format!("invalid URL '{url}'"),
            },
            GithubError::Unexpected(message) => HostError::InvalidResponse { message },
        }
    }
}
