//! Top-level and port-level error types for the article domain.
//!
//! [`BlogcopError`] covers conditions that stop the service before any check
//! runs (bad configuration). [`HostError`] is what every port trait in
//! [`crate::ports`] returns; infrastructure crates convert their transport
//! errors into it so the orchestrator can reason about failures without
//! knowing about HTTP.
//!
//! There is no retry policy: a [`HostError`] fails the current article or
//! repository and is reported.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Service-level errors
// ---------------------------------------------------------------------------

/// Errors that prevent the service from starting a check.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlogcopError {
    /// The expiration window could not be parsed.
    ///
    /// Accepted forms are `"<n> month(s)"`, `"<n> week(s)"` and `"<n> day(s)"`
    /// with `n > 0`.
    #[error("Invalid expiration '{value}': expected e.g. '3 months' or '90 days'")]
    InvalidExpiration {
        /// The rejected input.
        value: String,
    },

    /// The runtime configuration is invalid.
    ///
    /// Produced at load time; no check ever starts with an invalid config.
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Port errors
// ---------------------------------------------------------------------------

/// Failure reported by a repository host (GitHub) through a port trait.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    /// The requested resource does not exist or is not visible to the installation.
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// The write conflicted with current state (e.g. stale blob SHA, existing ref).
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// The feature is disabled or gone for this repository (e.g. issues turned off).
    #[error("Unavailable: {message}")]
    Unavailable { message: String },

    /// Credentials were rejected or lack the required permission.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Any other non-success response.
    #[error("Request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The request never produced a response (DNS, TLS, connection reset, timeout).
    #[error("Transport failure: {message}")]
    Transport { message: String },

    /// A response arrived but could not be interpreted.
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },
}
