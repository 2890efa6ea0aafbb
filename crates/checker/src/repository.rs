//! Single-repository check: find outdated articles and unpublish them.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use articles::{
    is_outdated, Article, ArticleEntry, BranchName, ExpirationPolicy, HostError,
    MalformedContent, PullRequestNumber, RepositoryHost, RepositoryId, Remediation,
};

use crate::report::{ArticleOutcome, ArticleReport, RepositoryReport};

/// Settings shared by every check in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSettings {
    /// Branch the blog publishes from and pull requests target.
    pub main_branch: BranchName,
    /// Directory holding the articles, relative to the repository root.
    pub posts_dir: String,
    pub policy: ExpirationPolicy,
    /// Detect and report outdated articles without writing anything.
    pub dry_run: bool,
}

/// Why one article could not be processed.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Article has no front matter: {0}")]
    MalformedContent(#[from] MalformedContent),

    #[error(transparent)]
    Host(#[from] HostError),

    /// A write failed after the unpublish branch was created. Later runs skip
    /// the article until the branch is deleted.
    #[error("{source}; branch {branch} was left behind and must be deleted before the article is checked again")]
    BranchLeftBehind {
        branch: BranchName,
        #[source]
        source: HostError,
    },
}

/// Checks the articles of one repository through a host session.
pub struct RepositoryChecker<'a> {
    host: &'a dyn RepositoryHost,
    settings: &'a CheckSettings,
}

impl<'a> RepositoryChecker<'a> {
    /// Checks repositories through `host` with the given settings.
    pub fn new(host: &'a dyn RepositoryHost, settings: &'a CheckSettings) -> Self {
        Self { host, settings }
    }

    /// Checks every article in the posts directory, in listing order.
    ///
    /// Failing to list the directory fails the repository. A failure on one
    /// article is recorded in the report and the next article is checked.
    #[instrument(skip_all, fields(repository = %repository))]
    pub async fn check_repository(
        &self,
        repository: &RepositoryId,
        today: NaiveDate,
    ) -> Result<RepositoryReport, HostError> {
        let entries = self
            .host
            .list_directory(repository, &self.settings.posts_dir, &self.settings.main_branch)
            .await?;
        info!(articles = entries.len(), "Checking articles");

        let mut report = RepositoryReport::new(repository.clone());
        for entry in entries {
            let outcome = match self.check_article(repository, &entry, today).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(path = %entry.path, error = %e, "Failed to process article");
                    ArticleOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            report.articles.push(ArticleReport {
                path: entry.path,
                outcome,
            });
        }

        info!(
            unpublished = report.unpublished_count(),
            failed = report.failed_count(),
            "Repository check finished"
        );
        Ok(report)
    }

    /// Checks one article and unpublishes it if it is outdated.
    pub async fn check_article(
        &self,
        repository: &RepositoryId,
        entry: &ArticleEntry,
        today: NaiveDate,
    ) -> Result<ArticleOutcome, CheckError> {
        let settings = self.settings;
        let host = self.host;

        let Some(last_modified) = host
            .last_commit_date(repository, &settings.main_branch, &entry.path)
            .await?
        else {
            warn!(path = %entry.path, "No commit history for article, skipping");
            return Ok(ArticleOutcome::NoHistory);
        };

        if !is_outdated(last_modified, settings.policy, today) {
            debug!(path = %entry.path, %last_modified, "Article is fresh");
            return Ok(ArticleOutcome::Fresh { last_modified });
        }
        info!(path = %entry.path, %last_modified, "Article is outdated");

        let branch = entry.branch_name();
        if host.branch_exists(repository, &branch).await? {
            info!(%branch, "Unpublish branch already exists, skipping");
            return Ok(ArticleOutcome::AlreadyInProgress { branch });
        }

        // Malformed posts must fail before any branch exists.
        let content = host.fetch_content(entry).await?;
        let article = Article::new(entry.clone(), content, last_modified);
        let plan = Remediation::plan(&article, &settings.main_branch, settings.policy)?;

        if settings.dry_run {
            info!(%branch, "Dry run, not unpublishing");
            return Ok(ArticleOutcome::WouldUnpublish { branch });
        }

        info!(%branch, "Creating branch");
        let head = host.branch_head(repository, &settings.main_branch).await?;
        host.create_branch(repository, &plan.branch, &head).await?;

        let pull_request = self
            .commit_and_open(repository, &plan)
            .await
            .map_err(|source| CheckError::BranchLeftBehind {
                branch: branch.clone(),
                source,
            })?;

        info!(%pull_request, "Creating issue");
        let issue = match host.create_issue(repository, &plan.issue).await {
            Ok(number) => Some(number),
            Err(e) => {
                // Issues can be disabled in the repository settings.
                warn!(error = %e, "Could not create tracking issue");
                None
            }
        };

        Ok(ArticleOutcome::Unpublished {
            branch,
            pull_request,
            issue,
        })
    }

    async fn commit_and_open(
        &self,
        repository: &RepositoryId,
        plan: &Remediation,
    ) -> Result<PullRequestNumber, HostError> {
        info!(branch = %plan.branch, "Pushing commit");
        self.host.update_file(repository, &plan.update).await?;

        info!(branch = %plan.branch, "Creating pull request");
        self.host
            .create_pull_request(repository, &plan.pull_request)
            .await
    }
}
