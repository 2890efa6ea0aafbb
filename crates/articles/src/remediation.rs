//! Texts and write requests produced when an outdated article is unpublished.
//!
//! A [`Remediation`] bundles everything the orchestrator sends to GitHub for
//! one article: the branch, the commit, the pull request and the tracking
//! issue. Building it is pure; the orchestrator performs the calls.

use serde::{Deserialize, Serialize};

use crate::front_matter::MalformedContent;
use crate::{Article, ArticlePath, BlobSha, BranchName, ExpirationPolicy};

/// Commit message and pull request title for every unpublish change.
pub const UNPUBLISH_TITLE: &str = "Unpublish outdated article";

/// Commit to the contents API replacing one file on a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpdate {
    pub path: ArticlePath,
    pub message: String,
    pub content: String,
    /// Blob SHA of the content being replaced.
    pub sha: BlobSha,
    pub branch: BranchName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestDraft {
    pub title: String,
    pub body: String,
    /// Branch carrying the change.
    pub head: BranchName,
    /// Branch the change is merged into.
    pub base: BranchName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDraft {
    pub title: String,
    pub body: String,
}

/// All write requests needed to unpublish one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remediation {
    pub branch: BranchName,
    pub update: FileUpdate,
    pub pull_request: PullRequestDraft,
    pub issue: IssueDraft,
}

impl Remediation {
    /// Plans the unpublish change for `article`, targeting `main_branch`.
    ///
    /// Fails when the article has no front matter to rewrite.
    pub fn plan(
        article: &Article,
        main_branch: &BranchName,
        policy: ExpirationPolicy,
    ) -> Result<Self, MalformedContent> {
        let branch = article.entry().branch_name();
        let content = article.unpublished_content()?;

        Ok(Self {
            update: FileUpdate {
                path: article.path().clone(),
                message: UNPUBLISH_TITLE.to_string(),
                content,
                sha: article.sha().clone(),
                branch: branch.clone(),
            },
            pull_request: PullRequestDraft {
                title: UNPUBLISH_TITLE.to_string(),
                body: pull_request_body(article.path(), policy),
                head: branch.clone(),
                base: main_branch.clone(),
            },
            issue: IssueDraft {
                title: issue_title(article.path()),
                body: issue_body(article.path()),
            },
            branch,
        })
    }
}

/// Body of the unpublish pull request.
pub fn pull_request_body(path: &ArticlePath, policy: ExpirationPolicy) -> String {
    format!(
        "This PR unpublishes the article `{path}` because its last update was more than {policy} ago."
    )
}

/// Title of the follow-up issue.
pub fn issue_title(path: &ArticlePath) -> String {
    format!("{path} needs to be updated")
}

/// Body of the follow-up issue.
pub fn issue_body(path: &ArticlePath) -> String {
    format!("`{path}` has been marked as unpublished and needs to be updated")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::ArticleEntry;

    fn some_path() -> ArticlePath {
        ArticlePath::new("some_path").unwrap()
    }

    fn article(content: &str) -> Article {
        Article::new(
            ArticleEntry {
                name: "2017-08-22-post.md".to_string(),
                path: ArticlePath::new("_posts/2017-08-22-post.md").unwrap(),
                sha: BlobSha::new("abc123").unwrap(),
                download_url: "https://raw.example.test/post.md".to_string(),
            },
            content,
            NaiveDate::from_ymd_opt(2017, 8, 22).unwrap(),
        )
    }

    #[test]
    fn pull_request_body_mentions_path_and_policy() {
        assert_eq!(
            pull_request_body(&some_path(), ExpirationPolicy::Months(3)),
            "This PR unpublishes the article `some_path` because its last update was more than 3 months ago."
        );
    }

    #[test]
    fn issue_texts_mention_path() {
        assert_eq!(issue_title(&some_path()), "some_path needs to be updated");
        assert_eq!(
            issue_body(&some_path()),
            "`some_path` has been marked as unpublished and needs to be updated"
        );
    }

    #[test]
    fn plan_targets_article_branch() {
        let main = BranchName::new("master").unwrap();
        let plan = Remediation::plan(
            &article("---\nlayout: post\n---\nbody\n"),
            &main,
            ExpirationPolicy::default(),
        )
        .unwrap();

        assert_eq!(plan.branch.as_str(), "unpublish/2017-08-22-post.md");
        assert_eq!(plan.update.branch, plan.branch);
        assert_eq!(plan.update.sha.as_str(), "abc123");
        assert_eq!(plan.update.message, UNPUBLISH_TITLE);
        assert_eq!(
            plan.update.content,
            "---\nlayout: post\npublished: false\n---\nbody\n"
        );
        assert_eq!(plan.pull_request.head, plan.branch);
        assert_eq!(plan.pull_request.base, main);
        assert_eq!(plan.pull_request.title, UNPUBLISH_TITLE);
        assert_eq!(plan.issue.title, "_posts/2017-08-22-post.md needs to be updated");
    }

    #[test]
    fn plan_fails_without_front_matter() {
        let main = BranchName::new("master").unwrap();
        assert_eq!(
            Remediation::plan(&article("just text"), &main, ExpirationPolicy::default()),
            Err(MalformedContent)
        );
    }
}
