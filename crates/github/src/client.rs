//! Thin REST transport shared by the app and installation sessions.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::GithubError;

/// Public GitHub REST API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Per-request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("blogcop/", env!("CARGO_PKG_VERSION"));

const API_VERSION: &str = "2022-11-28";

/// Authenticated-request builder bound to one API base URL.
///
/// Cloning is cheap: the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base: Url,
}

impl RestClient {
    /// Creates a client for `api_url` (e.g. `https://api.github.com` or a
    /// GitHub Enterprise `https://ghe.example.com/api/v3`).
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, GithubError> {
        let base = Url::parse(api_url).map_err(|_| GithubError::InvalidUrl(api_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(GithubError::InvalidUrl(api_url.to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            HeaderName::from_static("x-github-api-version"),
            HeaderValue::from_static(API_VERSION),
        );

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { http, base })
    }

    /// Appends `segments` to the base URL.
    ///
    /// Each segment may itself contain `/` (repository full names, file paths,
    /// branch names); it is split so every component is escaped separately.
    pub fn endpoint<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, GithubError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| GithubError::InvalidUrl(self.base.to_string()))?;
            path.pop_if_empty();
            for segment in segments {
                path.extend(segment.split('/').filter(|part| !part.is_empty()));
            }
        }
        Ok(url)
    }

    /// Starts a request authenticated with `token` as a bearer credential.
    pub fn request(&self, method: Method, url: Url, token: &str) -> RequestBuilder {
        self.http.request(method, url).bearer_auth(token)
    }

    /// Sends `request`, turning non-success statuses into [`GithubError::Api`].
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, GithubError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let resource = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();
        Err(GithubError::from_response(status.as_u16(), resource, &body))
    }

    /// Sends `request` and decodes a JSON success body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, GithubError> {
        Ok(self.send(request).await?.json().await?)
    }
}
