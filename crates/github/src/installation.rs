//! Installation-scoped session implementing the article ports.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::NaiveDate;
use reqwest::{Method, Url};
use tracing::{debug, info};

use articles::{
    ArticleEntry, ArticlePath, BranchName, CodeRepository, CommitSha, FileUpdate, HostError,
    InstallationId, IssueDraft, IssueNumber, IssueTracker, PullRequestDraft, PullRequestManager,
    PullRequestNumber, RepositoryId,
};

use crate::app::PER_PAGE;
use crate::models::{
    repository_ids, CommitDto, ContentItemDto, CreateIssueRequest, CreatePullRequest,
    CreateRefRequest, InstallationRepositoriesDto, NumberedDto, RefDto, UpdateContentsRequest,
};
use crate::{GithubError, RestClient};

/// Session authenticated with one installation's access token.
#[derive(Clone)]
pub struct InstallationClient {
    client: RestClient,
    installation: InstallationId,
    token: String,
}

impl InstallationClient {
    /// Wraps an installation access token obtained from [`crate::GithubApp`].
    pub fn new(client: RestClient, installation: InstallationId, token: impl Into<String>) -> Self {
        Self {
            client,
            installation,
            token: token.into(),
        }
    }

    fn repo_endpoint<'a>(
        &self,
        repository: &'a RepositoryId,
        rest: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, GithubError> {
        self.client
            .endpoint(["repos", repository.as_str()].into_iter().chain(rest))
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T, GithubError> {
        let request = self
            .client
            .request(Method::GET, url, &self.token)
            .query(query);
        self.client.send_json(request).await
    }

    async fn send_body<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> Result<T, GithubError> {
        let request = self.client.request(method, url, &self.token).json(body);
        self.client.send_json(request).await
    }
}

impl std::fmt::Debug for InstallationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallationClient")
            .field("installation", &self.installation)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CodeRepository for InstallationClient {
    async fn list_repositories(&self) -> Result<Vec<RepositoryId>, HostError> {
        let mut repositories = Vec::new();

        for page in 1usize.. {
            let url = self.client.endpoint(["installation", "repositories"])?;
            let request = self
                .client
                .request(Method::GET, url, &self.token)
                .query(&[("per_page", PER_PAGE), ("page", page)]);
            let batch: InstallationRepositoriesDto = self.client.send_json(request).await?;

            let total = batch.total_count;
            let fetched = batch.repositories.len();
            repositories.extend(repository_ids(batch));

            if fetched < PER_PAGE || page * PER_PAGE >= total {
                break;
            }
        }

        debug!(
            installation = %self.installation,
            count = repositories.len(),
            "Listed installation repositories"
        );
        Ok(repositories)
    }

    async fn list_directory(
        &self,
        repository: &RepositoryId,
        directory: &str,
        branch: &BranchName,
    ) -> Result<Vec<ArticleEntry>, HostError> {
        let url = self.repo_endpoint(repository, ["contents", directory])?;
        let items: Vec<ContentItemDto> = self.get(url, &[("ref", branch.as_str())]).await?;

        Ok(items
            .into_iter()
            .filter_map(ContentItemDto::into_article_entry)
            .collect())
    }

    async fn fetch_content(&self, entry: &ArticleEntry) -> Result<String, HostError> {
        let url = Url::parse(&entry.download_url)
            .map_err(|_| GithubError::InvalidUrl(entry.download_url.clone()))?;
        let response = self
            .client
            .send(self.client.request(Method::GET, url, &self.token))
            .await?;
        let bytes = response.bytes().await.map_err(GithubError::from)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            GithubError::Unexpected(format!(
                "{} is not valid UTF-8 (invalid byte at offset {})",
                entry.path,
                e.utf8_error().valid_up_to()
            ))
            .into()
        })
    }

    async fn last_commit_date(
        &self,
        repository: &RepositoryId,
        branch: &BranchName,
        path: &ArticlePath,
    ) -> Result<Option<NaiveDate>, HostError> {
        let url = self.repo_endpoint(repository, ["commits"])?;
        let commits: Vec<CommitDto> = self
            .get(
                url,
                &[
                    ("sha", branch.as_str()),
                    ("path", path.as_str()),
                    ("per_page", "1"),
                ],
            )
            .await?;

        Ok(commits.first().and_then(CommitDto::committed_on))
    }

    async fn branch_head(
        &self,
        repository: &RepositoryId,
        branch: &BranchName,
    ) -> Result<CommitSha, HostError> {
        let url = self.repo_endpoint(repository, ["git", "ref", "heads", branch.as_str()])?;
        let reference: RefDto = self.get(url, &[]).await?;
        Ok(reference.commit_sha()?)
    }

    async fn branch_exists(
        &self,
        repository: &RepositoryId,
        branch: &BranchName,
    ) -> Result<bool, HostError> {
        // matching-refs is a prefix match: "unpublish/a.md" also matches
        // "unpublish/a.md.bak".
        let url = self.repo_endpoint(
            repository,
            ["git", "matching-refs", "heads", branch.as_str()],
        )?;
        let references: Vec<RefDto> = self.get(url, &[]).await?;
        let wanted = branch.to_ref();
        Ok(references.iter().any(|r| r.git_ref == wanted))
    }

    async fn create_branch(
        &self,
        repository: &RepositoryId,
        branch: &BranchName,
        from: &CommitSha,
    ) -> Result<(), HostError> {
        let url = self.repo_endpoint(repository, ["git", "refs"])?;
        let body = CreateRefRequest {
            git_ref: branch.to_ref(),
            sha: from.as_str(),
        };
        let _: RefDto = self.send_body(Method::POST, url, &body).await?;

        info!(repository = %repository, branch = %branch, "Created branch");
        Ok(())
    }

    async fn update_file(
        &self,
        repository: &RepositoryId,
        update: &FileUpdate,
    ) -> Result<(), HostError> {
        let url = self.repo_endpoint(repository, ["contents", update.path.as_str()])?;
        let body = UpdateContentsRequest {
            message: &update.message,
            content: STANDARD.encode(update.content.as_bytes()),
            sha: update.sha.as_str(),
            branch: update.branch.as_str(),
        };
        let _: serde_json::Value = self.send_body(Method::PUT, url, &body).await?;

        info!(repository = %repository, path = %update.path, branch = %update.branch, "Committed file");
        Ok(())
    }
}

#[async_trait]
impl PullRequestManager for InstallationClient {
    async fn create_pull_request(
        &self,
        repository: &RepositoryId,
        draft: &PullRequestDraft,
    ) -> Result<PullRequestNumber, HostError> {
        let url = self.repo_endpoint(repository, ["pulls"])?;
        let body = CreatePullRequest {
            title: &draft.title,
            head: draft.head.as_str(),
            base: draft.base.as_str(),
            body: &draft.body,
        };
        let created: NumberedDto = self.send_body(Method::POST, url, &body).await?;
        Ok(PullRequestNumber::new(created.number))
    }
}

#[async_trait]
impl IssueTracker for InstallationClient {
    async fn create_issue(
        &self,
        repository: &RepositoryId,
        draft: &IssueDraft,
    ) -> Result<IssueNumber, HostError> {
        let url = self.repo_endpoint(repository, ["issues"])?;
        let body = CreateIssueRequest {
            title: &draft.title,
            body: &draft.body,
        };
        let created: NumberedDto = self.send_body(Method::POST, url, &body).await?;
        Ok(IssueNumber::new(created.number))
    }
}
