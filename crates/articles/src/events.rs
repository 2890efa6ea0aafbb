//! Webhook events that trigger a repository check.

use serde::{Deserialize, Serialize};

use crate::{BranchName, InstallationId, RepositoryId};

/// A push delivered by GitHub, reduced to the fields a check needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    /// Repository that received the push.
    pub repository: RepositoryId,
    /// Installation whose token is used to act on the repository.
    pub installation: InstallationId,
    /// Fully qualified ref that was pushed, e.g. `refs/heads/master`.
    pub git_ref: String,
}

impl PushEvent {
    /// Returns `true` if the push updated `branch`.
    pub fn targets(&self, branch: &BranchName) -> bool {
        self.git_ref == branch.to_ref()
    }
}
