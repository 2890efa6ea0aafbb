//! Typed GitHub REST payloads and their conversion into domain types.
//!
//! Only the fields Blogcop reads are declared; everything else in the
//! responses is ignored by serde.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use articles::{
    AccountLogin, ArticleEntry, ArticlePath, BlobSha, CommitSha, Installation, InstallationId,
    RepositoryId,
};

use crate::GithubError;

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AccountDto {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallationDto {
    pub id: u64,
    pub account: AccountDto,
}

impl TryFrom<InstallationDto> for Installation {
    type Error = GithubError;

    fn try_from(dto: InstallationDto) -> Result<Self, Self::Error> {
        Ok(Installation {
            id: InstallationId::new(dto.id),
            account: AccountLogin::new(dto.account.login).ok_or_else(|| {
                GithubError::Unexpected(format!("installation {} has no account login", dto.id))
            })?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenDto {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryDto {
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallationRepositoriesDto {
    pub total_count: usize,
    pub repositories: Vec<RepositoryDto>,
}

/// One entry of a directory listing from the contents API.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentItemDto {
    pub name: String,
    pub path: String,
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub download_url: Option<String>,
}

impl ContentItemDto {
    /// Converts a file entry into an [`ArticleEntry`]; directories, symlinks
    /// and submodules yield `None`.
    pub fn into_article_entry(self) -> Option<ArticleEntry> {
        if self.kind != "file" {
            return None;
        }
        Some(ArticleEntry {
            path: ArticlePath::new(self.path)?,
            sha: BlobSha::new(self.sha)?,
            download_url: self.download_url?,
            name: self.name,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignatureDto {
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetailDto {
    pub committer: Option<SignatureDto>,
    pub author: Option<SignatureDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDto {
    pub sha: String,
    pub commit: CommitDetailDto,
}

impl CommitDto {
    /// Calendar date (UTC) the commit was committed, falling back to the
    /// author date when GitHub omits the committer.
    pub fn committed_on(&self) -> Option<NaiveDate> {
        self.commit
            .committer
            .as_ref()
            .or(self.commit.author.as_ref())
            .map(|signature| signature.date.date_naive())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefObjectDto {
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefDto {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub object: RefObjectDto,
}

impl RefDto {
    /// Commit the ref points at.
    pub fn commit_sha(self) -> Result<CommitSha, GithubError> {
        CommitSha::new(self.object.sha)
            .ok_or_else(|| GithubError::Unexpected(format!("ref {} has no sha", self.git_ref)))
    }
}

/// Response of pull request and issue creation.
#[derive(Debug, Clone, Deserialize)]
pub struct NumberedDto {
    pub number: u64,
}

/// Returns the repository ids listed in an installation repositories page.
pub fn repository_ids(page: InstallationRepositoriesDto) -> Vec<RepositoryId> {
    page.repositories
        .into_iter()
        .filter_map(|r| RepositoryId::new(r.full_name))
        .collect()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CreateRefRequest<'a> {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub sha: &'a str,
}

#[derive(Debug, Serialize)]
pub struct UpdateContentsRequest<'a> {
    pub message: &'a str,
    /// Base64-encoded file content.
    pub content: String,
    pub sha: &'a str,
    pub branch: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreatePullRequest<'a> {
    pub title: &'a str,
    pub head: &'a str,
    pub base: &'a str,
    pub body: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreateIssueRequest<'a> {
    pub title: &'a str,
    pub body: &'a str,
}
