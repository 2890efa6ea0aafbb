//! App-level session: enumerates installations and mints installation tokens.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use tracing::{debug, info, instrument, warn};

use articles::{HostError, Installation, InstallationId, InstallationProvider, RepositoryHost};

use crate::models::{AccessTokenDto, InstallationDto};
use crate::{AppCredentials, GithubError, InstallationClient, RestClient};

/// Page size used for every paginated listing.
pub(crate) const PER_PAGE: usize = 100;

/// GitHub App authenticated with its own JWT.
#[derive(Debug, Clone)]
pub struct GithubApp {
    client: RestClient,
    credentials: AppCredentials,
}

impl GithubApp {
    /// Creates an app session; no request is made until it is used.
    pub fn new(client: RestClient, credentials: AppCredentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    async fn installations(&self) -> Result<Vec<Installation>, GithubError> {
        let jwt = self.credentials.jwt(Utc::now())?;
        let mut installations = Vec::new();

        for page in 1.. {
            let url = self.client.endpoint(["app", "installations"])?;
            let request = self
                .client
                .request(Method::GET, url, &jwt)
                .query(&[("per_page", PER_PAGE), ("page", page)]);
            let batch: Vec<InstallationDto> = self.client.send_json(request).await?;
            let last_page = batch.len() < PER_PAGE;

            for dto in batch {
                match Installation::try_from(dto) {
                    Ok(installation) => installations.push(installation),
                    Err(e) => warn!(error = %e, "Skipping installation"),
                }
            }

            if last_page {
                break;
            }
        }

        Ok(installations)
    }

    async fn installation_token(&self, installation: InstallationId) -> Result<String, GithubError> {
        let jwt = self.credentials.jwt(Utc::now())?;
        let id = installation.to_string();
        let url = self
            .client
            .endpoint(["app", "installations", id.as_str(), "access_tokens"])?;
        let token: AccessTokenDto = self
            .client
            .send_json(self.client.request(Method::POST, url, &jwt))
            .await?;

        debug!(expires_at = ?token.expires_at, "Minted installation token");
        Ok(token.token)
    }
}

#[async_trait]
impl InstallationProvider for GithubApp {
    #[instrument(skip(self), fields(app_id = %self.credentials.app_id()))]
    async fn list_installations(&self) -> Result<Vec<Installation>, HostError> {
        let installations = self.installations().await?;
        info!(count = installations.len(), "Listed installations");
        Ok(installations)
    }

    #[instrument(skip(self))]
    async fn connect(
        &self,
        installation: InstallationId,
    ) -> Result<Box<dyn RepositoryHost>, HostError> {
        let token = self.installation_token(installation).await?;
        Ok(Box::new(InstallationClient::new(
            self.client.clone(),
            installation,
            token,
        )))
    }
}
