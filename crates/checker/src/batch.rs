//! Scheduled check across every repository of every allowed installation.

use chrono::NaiveDate;
use tracing::{error, info, instrument};

use articles::{AccountLogin, CheckRunId, HostError, Installation, InstallationProvider};

use crate::report::{BatchReport, RunFailure};
use crate::{CheckSettings, RepositoryChecker};

/// Runs a check over all repositories reachable through the GitHub App.
pub struct BatchChecker<'a> {
    provider: &'a dyn InstallationProvider,
    settings: &'a CheckSettings,
    allowed_accounts: &'a [AccountLogin],
}

impl<'a> BatchChecker<'a> {
    /// `allowed_accounts` restricts the run to installations on those accounts;
    /// an empty list allows every installation.
    pub fn new(
        provider: &'a dyn InstallationProvider,
        settings: &'a CheckSettings,
        allowed_accounts: &'a [AccountLogin],
    ) -> Self {
        Self {
            provider,
            settings,
            allowed_accounts,
        }
    }

    fn is_allowed(&self, installation: &Installation) -> bool {
        self.allowed_accounts.is_empty()
            || self
                .allowed_accounts
                .iter()
                .any(|a| a.as_str().eq_ignore_ascii_case(installation.account.as_str()))
    }

    /// Checks installations, then repositories, one at a time.
    ///
    /// Only failing to list installations fails the run. Installations and
    /// repositories that cannot be checked are recorded in
    /// [`BatchReport::failures`] and the run moves on.
    #[instrument(skip_all, fields(run_id = %run_id))]
    pub async fn run(&self, run_id: CheckRunId, today: NaiveDate) -> Result<BatchReport, HostError> {
        let installations = self.provider.list_installations().await?;
        let mut report = BatchReport::default();

        for installation in installations {
            if !self.is_allowed(&installation) {
                info!(account = %installation.account, "Skipping installation outside allow-list");
                continue;
            }
            self.check_installation(&installation, today, &mut report).await;
        }

        info!(
            repositories = report.repositories.len(),
            unpublished = report.unpublished_count(),
            failures = report.failures.len(),
            "Batch check finished"
        );
        Ok(report)
    }

    #[instrument(skip_all, fields(installation = %installation.id, account = %installation.account))]
    async fn check_installation(
        &self,
        installation: &Installation,
        today: NaiveDate,
        report: &mut BatchReport,
    ) {
        info!("Authenticating installation");
        let host = match self.provider.connect(installation.id).await {
            Ok(host) => host,
            Err(e) => {
                error!(error = %e, "Could not authenticate installation");
                report.failures.push(RunFailure {
                    scope: format!("installation {}", installation.id),
                    reason: e.to_string(),
                });
                return;
            }
        };

        let repositories = match host.list_repositories().await {
            Ok(repositories) => repositories,
            Err(e) => {
                error!(error = %e, "Could not list installation repositories");
                report.failures.push(RunFailure {
                    scope: format!("installation {}", installation.id),
                    reason: e.to_string(),
                });
                return;
            }
        };

        let checker = RepositoryChecker::new(host.as_ref(), self.settings);
        for repository in repositories {
            match checker.check_repository(&repository, today).await {
                Ok(repo_report) => report.repositories.push(repo_report),
                Err(e) => {
                    error!(%repository, error = %e, "Could not check repository");
                    report.failures.push(RunFailure {
                        scope: repository.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}
