//! Port traits implemented by infrastructure crates.
//!
//! The orchestrator in the `checker` crate depends only on these traits. The
//! `github` crate implements them over the GitHub REST API; tests implement
//! them in memory.
//!
//! All traits are dyn-compatible via [`async_trait`] so hosts can be passed
//! around as `Box<dyn RepositoryHost>`.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    ArticleEntry, ArticlePath, BranchName, CommitSha, FileUpdate, HostError, Installation,
    InstallationId, IssueDraft, IssueNumber, PullRequestDraft, PullRequestNumber, PushEvent,
    RepositoryId,
};

/// Read and write access to repository contents and refs.
#[async_trait]
pub trait CodeRepository: Send + Sync {
    /// Repositories the current installation can access.
    async fn list_repositories(&self) -> Result<Vec<RepositoryId>, HostError>;

    /// Files directly inside `directory` on `branch`, in listing order.
    ///
    /// Subdirectories and other non-file entries are omitted.
    async fn list_directory(
        &self,
        repository: &RepositoryId,
        directory: &str,
        branch: &BranchName,
    ) -> Result<Vec<ArticleEntry>, HostError>;

    /// Raw content of a listed file.
    async fn fetch_content(&self, entry: &ArticleEntry) -> Result<String, HostError>;

    /// Committer date of the most recent commit on `branch` touching `path`.
    ///
    /// `None` when no commit touches the path.
    async fn last_commit_date(
        &self,
        repository: &RepositoryId,
        branch: &BranchName,
        path: &ArticlePath,
    ) -> Result<Option<NaiveDate>, HostError>;

    /// SHA of the commit at the tip of `branch`.
    async fn branch_head(
        &self,
        repository: &RepositoryId,
        branch: &BranchName,
    ) -> Result<CommitSha, HostError>;

    async fn branch_exists(
        &self,
        repository: &RepositoryId,
        branch: &BranchName,
    ) -> Result<bool, HostError>;

    /// Creates `branch` pointing at `from`.
    async fn create_branch(
        &self,
        repository: &RepositoryId,
        branch: &BranchName,
        from: &CommitSha,
    ) -> Result<(), HostError>;

    /// Commits new content for one file. Fails with [`HostError::Conflict`]
    /// when `update.sha` is stale.
    async fn update_file(
        &self,
        repository: &RepositoryId,
        update: &FileUpdate,
    ) -> Result<(), HostError>;
}

/// Opens pull requests.
#[async_trait]
pub trait PullRequestManager: Send + Sync {
    /// Opens a pull request from `draft.head` into `draft.base`.
    async fn create_pull_request(
        &self,
        repository: &RepositoryId,
        draft: &PullRequestDraft,
    ) -> Result<PullRequestNumber, HostError>;
}

/// Files issues.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Files an issue. Repositories with issues disabled return
    /// [`HostError::Unavailable`].
    async fn create_issue(
        &self,
        repository: &RepositoryId,
        draft: &IssueDraft,
    ) -> Result<IssueNumber, HostError>;
}

/// Everything the orchestrator needs from one authenticated host session.
pub trait RepositoryHost: CodeRepository + PullRequestManager + IssueTracker {}

impl<T> RepositoryHost for T where T: CodeRepository + PullRequestManager + IssueTracker {}

/// App-level access: enumerates installations and opens sessions for them.
#[async_trait]
pub trait InstallationProvider: Send + Sync {
    async fn list_installations(&self) -> Result<Vec<Installation>, HostError>;

    /// Authenticates as `installation` and returns a host scoped to it.
    async fn connect(
        &self,
        installation: InstallationId,
    ) -> Result<Box<dyn RepositoryHost>, HostError>;
}

/// Receives verified push events from the webhook listener.
#[async_trait]
pub trait PushHandler: Send + Sync {
    async fn handle_push(&self, event: PushEvent) -> Result<(), HostError>;
}
