//! Article domain for Blogcop.
//!
//! Blogcop watches a Jekyll blog's `_posts` directory and unpublishes articles
//! that have not changed for longer than a configured window: it opens a branch,
//! flips the post's front matter to `published: false`, opens a pull request
//! and files a tracking issue.
//!
//! This crate holds every domain rule and port definition. Infrastructure
//! crates implement the traits in [`ports`]; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`RepositoryId`, `BranchName`, etc.) |
//! | [`types`] | `ExpirationPolicy`, `ArticleEntry`, `Article`, `Installation` |
//! | [`staleness`] | The outdated-article rule |
//! | [`front_matter`] | Front-matter rewriting |
//! | [`remediation`] | Branch, commit, pull request and issue contents |
//! | [`events`] | Webhook push events |
//! | [`ports`] | Traits implemented by infrastructure crates |
//! | [`errors`] | Service-level and port-level errors |

pub mod errors;
pub mod events;
pub mod front_matter;
pub mod identifiers;
pub mod ports;
pub mod remediation;
pub mod staleness;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{BlogcopError, HostError};
pub use events::PushEvent;
pub use front_matter::{rewrite_unpublished, MalformedContent};
pub use identifiers::{
    AccountLogin, ArticlePath, BlobSha, BranchName, CheckRunId, CommitSha, InstallationId,
    IssueNumber, PullRequestNumber, RepositoryId,
};
pub use ports::{
    CodeRepository, InstallationProvider, IssueTracker, PullRequestManager, PushHandler,
    RepositoryHost,
};
pub use remediation::{FileUpdate, IssueDraft, PullRequestDraft, Remediation, UNPUBLISH_TITLE};
pub use staleness::is_outdated;
pub use types::{Article, ArticleEntry, ExpirationPolicy, Installation};
