//! Push webhook payload, reduced to the fields a check needs.

use serde::Deserialize;

use articles::{InstallationId, PushEvent, RepositoryId};

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryPayload {
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallationPayload {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushPayload {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub repository: RepositoryPayload,
    /// Absent when the hook was configured on the repository rather than
    /// delivered through the GitHub App.
    pub installation: Option<InstallationPayload>,
}

impl PushPayload {
    /// Converts into a domain [`PushEvent`], describing the first missing field
    /// on failure.
    pub fn into_event(self) -> Result<PushEvent, String> {
        let installation = self
            .installation
            .ok_or_else(|| "push payload has no installation".to_string())?;
        let repository = RepositoryId::new(self.repository.full_name)
            .ok_or_else(|| "push payload has an empty repository name".to_string())?;
        Ok(PushEvent {
            repository,
            installation: InstallationId::new(installation.id),
            git_ref: self.git_ref,
        })
    }
}
