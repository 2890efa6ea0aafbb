//! Push-triggered check of a single repository.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, Instrument};

use articles::{CheckRunId, HostError, InstallationProvider, PushEvent, PushHandler};

use crate::{CheckSettings, RepositoryChecker};

/// Checks a repository whenever its main branch receives a push.
///
/// Runs are serialized: a second delivery waits until the first finishes, so
/// two runs can never both see an unpublish branch as missing and race to
/// create it.
pub struct WebhookChecker<P> {
    provider: P,
    settings: CheckSettings,
    today: fn() -> NaiveDate,
    run_lock: Mutex<()>,
}

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

impl<P: InstallationProvider> WebhookChecker<P> {
    /// Uses the UTC calendar date as "today".
    pub fn new(provider: P, settings: CheckSettings) -> Self {
        Self {
            provider,
            settings,
            today: utc_today,
            run_lock: Mutex::new(()),
        }
    }

    /// Replaces the clock used to decide what "today" is.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }
}

#[async_trait]
impl<P: InstallationProvider> PushHandler for WebhookChecker<P> {
    #[instrument(skip_all, fields(repository = %event.repository, git_ref = %event.git_ref))]
    async fn handle_push(&self, event: PushEvent) -> Result<(), HostError> {
        if !event.targets(&self.settings.main_branch) {
            debug!("Push is not to the main branch, ignoring");
            return Ok(());
        }

        let _guard = self.run_lock.lock().await;
        let run_id = CheckRunId::new_random();
        let span = tracing::info_span!("push_check", %run_id);

        async {
            info!(installation = %event.installation, "Authenticating installation");
            let host = self.provider.connect(event.installation).await?;

            let report = RepositoryChecker::new(host.as_ref(), &self.settings)
                .check_repository(&event.repository, (self.today)())
                .await?;

            info!(
                unpublished = report.unpublished_count(),
                failed = report.failed_count(),
                "Push check finished"
            );
            Ok::<(), HostError>(())
        }
        .instrument(span)
        .await
    }
}
