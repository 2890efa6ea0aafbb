//! Outcomes recorded by a check run.

use chrono::NaiveDate;
use serde::Serialize;

use articles::{ArticlePath, BranchName, IssueNumber, PullRequestNumber, RepositoryId};

/// What happened to one article during a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ArticleOutcome {
    /// Changed recently enough; nothing to do.
    Fresh { last_modified: NaiveDate },
    /// No commit on the main branch touches the article.
    NoHistory,
    /// Outdated, but its unpublish branch already exists.
    AlreadyInProgress { branch: BranchName },
    /// Outdated; a dry run stopped before writing anything.
    WouldUnpublish { branch: BranchName },
    /// Outdated and unpublished. `issue` is `None` when filing the tracking
    /// issue failed.
    Unpublished {
        branch: BranchName,
        pull_request: PullRequestNumber,
        issue: Option<IssueNumber>,
    },
    /// Processing stopped with an error; later articles were still checked.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleReport {
    pub path: ArticlePath,
    #[serde(flatten)]
    pub outcome: ArticleOutcome,
}

/// Outcomes for every article in one repository, in listing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryReport {
    pub repository: RepositoryId,
    pub articles: Vec<ArticleReport>,
}

impl RepositoryReport {
    /// Starts an empty report for `repository`.
    pub fn new(repository: RepositoryId) -> Self {
        Self {
            repository,
            articles: Vec::new(),
        }
    }

    /// Number of articles unpublished in this repository.
    pub fn unpublished_count(&self) -> usize {
        self.articles
            .iter()
            .filter(|a| matches!(a.outcome, ArticleOutcome::Unpublished { .. }))
            .count()
    }

    /// Number of articles that could not be processed.
    pub fn failed_count(&self) -> usize {
        self.articles
            .iter()
            .filter(|a| matches!(a.outcome, ArticleOutcome::Failed { .. }))
            .count()
    }
}

/// A repository or installation that could not be checked at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunFailure {
    /// What failed, e.g. `"installation 42"` or `"ombulabs/blog"`.
    pub scope: String,
    pub reason: String,
}

/// Outcome of a batch run across installations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub repositories: Vec<RepositoryReport>,
    pub failures: Vec<RunFailure>,
}

impl BatchReport {
    /// Returns `true` if any article, repository or installation failed.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty() || self.repositories.iter().any(|r| r.failed_count() > 0)
    }

    /// Number of articles unpublished across the whole run.
    pub fn unpublished_count(&self) -> usize {
        self.repositories.iter().map(RepositoryReport::unpublished_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcomes: Vec<ArticleOutcome>) -> RepositoryReport {
        RepositoryReport {
            repository: RepositoryId::new("ombulabs/blog").unwrap(),
            articles: outcomes
                .into_iter()
                .enumerate()
                .map(|(i, outcome)| ArticleReport {
                    path: ArticlePath::new(format!("_posts/{i}.md")).unwrap(),
                    outcome,
                })
                .collect(),
        }
    }

    #[test]
    fn counts_outcomes() {
        let repo = report(vec![
            ArticleOutcome::NoHistory,
            ArticleOutcome::Unpublished {
                branch: BranchName::new("unpublish/1.md").unwrap(),
                pull_request: PullRequestNumber::new(3),
                issue: None,
            },
            ArticleOutcome::Failed {
                reason: "boom".to_string(),
            },
        ]);
        assert_eq!(repo.unpublished_count(), 1);
        assert_eq!(repo.failed_count(), 1);

        let batch = BatchReport {
            repositories: vec![repo],
            failures: Vec::new(),
        };
        assert!(batch.has_failures());
        assert_eq!(batch.unpublished_count(), 1);
    }

    #[test]
    fn empty_batch_has_no_failures() {
        assert!(!BatchReport::default().has_failures());
    }
}
