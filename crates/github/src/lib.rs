//! Blogcop GitHub infrastructure adapter.
//!
//! Implements the port traits defined in the [`articles`] crate over the
//! GitHub REST API using [`reqwest`].
//!
//! - [`GithubApp`] authenticates as the GitHub App (RS256 JWT) and implements
//!   [`articles::InstallationProvider`].
//! - [`InstallationClient`] authenticates with an installation access token
//!   and implements [`articles::CodeRepository`],
//!   [`articles::PullRequestManager`] and [`articles::IssueTracker`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. All GitHub
//! API details (authentication, pagination, URL escaping, error statuses) are
//! handled here; the [`articles`] and `checker` crates never see them.
//!
//! ## SDK Gap Tracking
//!
//! The contents, refs, pull request and issue calls below were not available
//! through `github-bot-sdk`, so each endpoint is called directly:
//!
//! | Port method | Endpoint |
//! |-------------|----------|
//! | `list_directory` | `GET /repos/{repo}/contents/{dir}?ref=` |
//! | `fetch_content` | entry `download_url` (raw, strict UTF-8) |
//! | `last_commit_date` | `GET /repos/{repo}/commits?sha=&path=&per_page=1` |
//! | `branch_head` | `GET /repos/{repo}/git/ref/heads/{branch}` |
//! | `branch_exists` | `GET /repos/{repo}/git/matching-refs/heads/{branch}`, exact match |
//! | `create_branch` | `POST /repos/{repo}/git/refs` |
//! | `update_file` | `PUT /repos/{repo}/contents/{path}` |
//! | `create_pull_request` | `POST /repos/{repo}/pulls` |
//! | `create_issue` | `POST /repos/{repo}/issues` |

pub mod app;
pub mod auth;
pub mod client;
pub mod error;
pub mod installation;
pub mod models;

pub use app::GithubApp;
pub use auth::{AppClaims, AppCredentials};
pub use client::{RestClient, DEFAULT_API_URL, DEFAULT_TIMEOUT};
pub use error::GithubError;
pub use installation::InstallationClient;
