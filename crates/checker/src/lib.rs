//! Blogcop check orchestration.
//!
//! This crate sequences calls between the domain rules in [`articles`] and the
//! port traits implemented by infrastructure crates. It contains no domain
//! rules of its own.
//!
//! - [`RepositoryChecker`] walks one repository's posts directory and
//!   unpublishes each outdated article.
//! - [`BatchChecker`] runs the repository check for every repository of every
//!   allowed GitHub App installation.
//! - [`WebhookChecker`] implements [`articles::PushHandler`] and runs the
//!   repository check when the main branch receives a push.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Processing is strictly sequential: one
//! installation, repository and article at a time. A failure on one article,
//! repository or installation is logged, recorded in the report and does not
//! stop the rest of the run.

pub mod batch;
pub mod report;
pub mod repository;
pub mod webhook;

#[cfg(test)]
mod testing;

pub use batch::BatchChecker;
pub use report::{ArticleOutcome, ArticleReport, BatchReport, RepositoryReport, RunFailure};
pub use repository::{CheckError, CheckSettings, RepositoryChecker};
pub use webhook::WebhookChecker;
