//! Command-line and environment configuration.
//!
//! Every setting can come from a flag or its environment variable. Raw values
//! are validated into an [`AppConfig`] before any GitHub call is made.

use std::time::Duration;

use clap::Args;

use articles::{AccountLogin, BlogcopError, BranchName, ExpirationPolicy};
use checker::CheckSettings;

/// GitHub App identity and API endpoint.
#[derive(Debug, Clone, Args)]
pub struct GithubArgs {
    /// Numeric GitHub App id
    #[arg(long, env = "GITHUB_APP_IDENTIFIER", global = true)]
    pub app_id: Option<String>,

    /// PEM private key of the GitHub App; literal `\n` sequences are accepted
    #[arg(long, env = "GITHUB_PRIVATE_KEY", hide_env_values = true, global = true)]
    pub private_key: Option<String>,

    /// Base URL of the GitHub REST API
    #[arg(long, env = "GITHUB_API_URL", default_value = github::DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Timeout for each GitHub request, in seconds
    #[arg(long, env = "BLOGCOP_HTTP_TIMEOUT", default_value_t = 30, global = true)]
    pub timeout_secs: u64,
}

/// What counts as an outdated article and where to look for them.
#[derive(Debug, Clone, Args)]
pub struct PolicyArgs {
    /// Comma-separated accounts whose installations are checked; empty checks all
    #[arg(long, env = "BLOGCOP_ALLOWED_ORGS", default_value = "", global = true)]
    pub allowed_orgs: String,

    /// Age after which an article is outdated, e.g. "3 months" or "90 days"
    #[arg(long, env = "BLOGCOP_EXPIRATION", default_value = "3 months", global = true)]
    pub expiration: String,

    /// Branch the blog is published from
    #[arg(long, env = "BLOGCOP_MAIN_BRANCH", default_value = "master", global = true)]
    pub main_branch: String,

    /// Directory holding the articles
    #[arg(long, env = "BLOGCOP_POSTS_DIR", default_value = "_posts", global = true)]
    pub posts_dir: String,
}

/// Validated runtime configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub app_id: String,
    pub private_key: String,
    pub api_url: String,
    pub request_timeout: Duration,
    pub allowed_accounts: Vec<AccountLogin>,
    pub settings: CheckSettings,
}

impl AppConfig {
    /// Validates raw flag and environment values.
    pub fn from_args(
        github: &GithubArgs,
        policy: &PolicyArgs,
        dry_run: bool,
    ) -> Result<Self, BlogcopError> {
        let app_id = github
            .app_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| config_error("GITHUB_APP_IDENTIFIER is not set"))?;
        if !app_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(config_error(format!("app id '{app_id}' is not numeric")));
        }

        let private_key = github
            .private_key
            .as_deref()
            .map(normalize_private_key)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| config_error("GITHUB_PRIVATE_KEY is not set"))?;
        if !private_key.contains("-----BEGIN") {
            return Err(config_error("private key is not PEM encoded"));
        }

        if github.timeout_secs == 0 {
            return Err(config_error("HTTP timeout must be at least one second"));
        }

        let main_branch = BranchName::new(policy.main_branch.trim())
            .ok_or_else(|| config_error("main branch must not be empty"))?;

        let posts_dir = policy.posts_dir.trim().trim_matches('/');
        if posts_dir.is_empty() {
            return Err(config_error("posts directory must not be empty"));
        }

        Ok(Self {
            app_id: app_id.to_string(),
            private_key,
            api_url: github.api_url.trim().to_string(),
            request_timeout: Duration::from_secs(github.timeout_secs),
            allowed_accounts: parse_allowed_accounts(&policy.allowed_orgs),
            settings: CheckSettings {
                main_branch,
                posts_dir: posts_dir.to_string(),
                policy: policy.expiration.parse::<ExpirationPolicy>()?,
                dry_run,
            },
        })
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("app_id", &self.app_id)
            .field("api_url", &self.api_url)
            .field("request_timeout", &self.request_timeout)
            .field("allowed_accounts", &self.allowed_accounts)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Validates the webhook secret used by `serve`.
pub fn webhook_secret(raw: Option<&str>) -> Result<String, BlogcopError> {
    raw.filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| config_error("GITHUB_WEBHOOK_SECRET is not set"))
}

/// Turns literal `\n` escapes (as stored in single-line env files) into
/// newlines.
pub fn normalize_private_key(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

/// Splits a comma-separated allow-list, skipping blank entries.
pub fn parse_allowed_accounts(raw: &str) -> Vec<AccountLogin> {
    raw.split(',')
        .filter_map(|account| AccountLogin::new(account.trim()))
        .collect()
}

fn config_error(message: impl Into<String>) -> BlogcopError {
    BlogcopError::ConfigurationError {
        message: message.into(),
    }
}
