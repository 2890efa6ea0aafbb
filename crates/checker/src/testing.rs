//! In-memory port implementations for orchestration tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use articles::{
    AccountLogin, ArticleEntry, ArticlePath, BlobSha, BranchName, CodeRepository, CommitSha,
    ExpirationPolicy, FileUpdate, HostError, Installation, InstallationId, InstallationProvider,
    IssueDraft, IssueNumber, IssueTracker, PullRequestDraft, PullRequestManager,
    PullRequestNumber, RepositoryHost, RepositoryId,
};

use crate::CheckSettings;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn settings() -> CheckSettings {
    CheckSettings {
        main_branch: BranchName::new("master").unwrap(),
        posts_dir: "_posts".to_string(),
        policy: ExpirationPolicy::Months(3),
        dry_run: false,
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeState {
    pub repositories: Vec<RepositoryId>,
    pub entries: Vec<ArticleEntry>,
    pub contents: HashMap<String, String>,
    pub commit_dates: HashMap<String, NaiveDate>,
    pub branches: HashSet<String>,
    pub branch_sources: HashMap<String, String>,
    pub updates: Vec<FileUpdate>,
    pub pull_requests: Vec<PullRequestDraft>,
    pub issues: Vec<IssueDraft>,
    pub checked_repositories: Vec<RepositoryId>,
    pub content_fetches: usize,
    pub issues_disabled: bool,
    pub listing_fails: bool,
    pub failing_updates: HashSet<String>,
}

/// A repository host backed by shared in-memory state.
///
/// Clones share state, so a test can hand a clone to the code under test and
/// inspect the original afterwards.
#[derive(Debug, Clone, Default)]
pub struct FakeHost {
    state: Arc<Mutex<FakeState>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FakeState {
        self.state.lock().unwrap().clone()
    }

    pub fn add_repository(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .repositories
            .push(RepositoryId::new(name).unwrap());
    }

    pub fn add_article(&self, name: &str, content: &str, last_commit: Option<NaiveDate>) {
        let path = format!("_posts/{name}");
        let mut state = self.state.lock().unwrap();
        state.entries.push(ArticleEntry {
            name: name.to_string(),
            path: ArticlePath::new(path.clone()).unwrap(),
            sha: BlobSha::new(format!("sha-{name}")).unwrap(),
            download_url: format!("https://raw.example.test/{path}"),
        });
        state.contents.insert(path.clone(), content.to_string());
        if let Some(date) = last_commit {
            state.commit_dates.insert(path, date);
        }
    }

    pub fn add_branch(&self, name: &str) {
        self.state.lock().unwrap().branches.insert(name.to_string());
    }

    pub fn disable_issues(&self) {
        self.state.lock().unwrap().issues_disabled = true;
    }

    pub fn fail_listing(&self) {
        self.state.lock().unwrap().listing_fails = true;
    }

    pub fn fail_update_for(&self, path: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_updates
            .insert(path.to_string());
    }
}

#[async_trait]
impl CodeRepository for FakeHost {
    async fn list_repositories(&self) -> Result<Vec<RepositoryId>, HostError> {
        Ok(self.state.lock().unwrap().repositories.clone())
    }

    async fn list_directory(
        &self,
        repository: &RepositoryId,
        _directory: &str,
        _branch: &BranchName,
    ) -> Result<Vec<ArticleEntry>, HostError> {
        let mut state = self.state.lock().unwrap();
        state.checked_repositories.push(repository.clone());
        if state.listing_fails {
            return Err(HostError::NotFound {
                resource: "_posts".to_string(),
            });
        }
        Ok(state.entries.clone())
    }

    async fn fetch_content(&self, entry: &ArticleEntry) -> Result<String, HostError> {
        let mut state = self.state.lock().unwrap();
        state.content_fetches += 1;
        state
            .contents
            .get(entry.path.as_str())
            .cloned()
            .ok_or_else(|| HostError::NotFound {
                resource: entry.download_url.clone(),
            })
    }

    async fn last_commit_date(
        &self,
        _repository: &RepositoryId,
        _branch: &BranchName,
        path: &ArticlePath,
    ) -> Result<Option<NaiveDate>, HostError> {
        Ok(self.state.lock().unwrap().commit_dates.get(path.as_str()).copied())
    }

    async fn branch_head(
        &self,
        _repository: &RepositoryId,
        branch: &BranchName,
    ) -> Result<CommitSha, HostError> {
        Ok(CommitSha::new(format!("head-of-{branch}")).unwrap())
    }

    async fn branch_exists(
        &self,
        _repository: &RepositoryId,
        branch: &BranchName,
    ) -> Result<bool, HostError> {
        Ok(self.state.lock().unwrap().branches.contains(branch.as_str()))
    }

    async fn create_branch(
        &self,
        _repository: &RepositoryId,
        branch: &BranchName,
        from: &CommitSha,
    ) -> Result<(), HostError> {
        let mut state = self.state.lock().unwrap();
        if !state.branches.insert(branch.to_string()) {
            return Err(HostError::Conflict {
                message: format!("Reference already exists: {branch}"),
            });
        }
        state
            .branch_sources
            .insert(branch.to_string(), from.to_string());
        Ok(())
    }

    async fn update_file(
        &self,
        _repository: &RepositoryId,
        update: &FileUpdate,
    ) -> Result<(), HostError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_updates.contains(update.path.as_str()) {
            return Err(HostError::Conflict {
                message: format!("{} does not match {}", update.sha, update.path),
            });
        }
        state.updates.push(update.clone());
        Ok(())
    }
}

#[async_trait]
impl PullRequestManager for FakeHost {
    async fn create_pull_request(
        &self,
        _repository: &RepositoryId,
        draft: &PullRequestDraft,
    ) -> Result<PullRequestNumber, HostError> {
        let mut state = self.state.lock().unwrap();
        state.pull_requests.push(draft.clone());
        Ok(PullRequestNumber::new(state.pull_requests.len() as u64))
    }
}

#[async_trait]
impl IssueTracker for FakeHost {
    async fn create_issue(
        &self,
        _repository: &RepositoryId,
        draft: &IssueDraft,
    ) -> Result<IssueNumber, HostError> {
        let mut state = self.state.lock().unwrap();
        if state.issues_disabled {
            return Err(HostError::Unavailable {
                message: "Issues are disabled for this repo".to_string(),
            });
        }
        state.issues.push(draft.clone());
        Ok(IssueNumber::new(state.issues.len() as u64))
    }
}

/// Installation provider handing out [`FakeHost`] sessions.
#[derive(Debug, Clone, Default)]
pub struct FakeProvider {
    pub installations: Vec<Installation>,
    pub hosts: HashMap<u64, FakeHost>,
    pub listing_fails: bool,
    pub connected: Arc<Mutex<Vec<InstallationId>>>,
}

impl FakeProvider {
    pub fn with_installation(mut self, id: u64, account: &str, host: FakeHost) -> Self {
        self.installations.push(Installation {
            id: InstallationId::new(id),
            account: AccountLogin::new(account).unwrap(),
        });
        self.hosts.insert(id, host);
        self
    }

    pub fn connected(&self) -> Vec<InstallationId> {
        self.connected.lock().unwrap().clone()
    }
}

#[async_trait]
impl InstallationProvider for FakeProvider {
    async fn list_installations(&self) -> Result<Vec<Installation>, HostError> {
        if self.listing_fails {
            return Err(HostError::Unauthorized {
                message: "A JSON web token could not be decoded".to_string(),
            });
        }
        Ok(self.installations.clone())
    }

    async fn connect(
        &self,
        installation: InstallationId,
    ) -> Result<Box<dyn RepositoryHost>, HostError> {
        self.connected.lock().unwrap().push(installation);
        match self.hosts.get(&installation.as_u64()) {
            Some(host) => Ok(Box::new(host.clone())),
            None => Err(HostError::NotFound {
                resource: format!("installation {installation}"),
            }),
        }
    }
}
