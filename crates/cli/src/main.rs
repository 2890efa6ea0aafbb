//! Blogcop CLI entry point.
//!
//! This binary is the composition root for the entire system:
//!
//! 1. **Parse configuration**: flags and environment variables, validated
//!    into an [`config::AppConfig`].
//! 2. **Wire observability**: `tracing-subscriber` with JSON or pretty output
//!    and an optional OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: the [`github::GithubApp`] session and, for
//!    `serve`, the webhook router.
//! 4. **Select trigger mode**:
//!    - `check` runs [`checker::BatchChecker`] once over every allowed
//!      installation and exits non-zero if anything failed.
//!    - `serve` listens for push deliveries and runs
//!      [`checker::WebhookChecker`] for each one on the main branch.

mod config;
mod telemetry;

use std::net::{IpAddr, SocketAddr};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use articles::CheckRunId;
use checker::{BatchChecker, BatchReport, WebhookChecker};
use github::{AppCredentials, GithubApp, RestClient};
use listener::WebhookState;

use crate::config::{webhook_secret, AppConfig, GithubArgs, PolicyArgs};
use crate::telemetry::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "blogcop")]
#[command(version)]
#[command(about = "Unpublishes outdated blog articles and opens pull requests to update them")]
struct Cli {
    #[command(flatten)]
    github: GithubArgs,

    #[command(flatten)]
    policy: PolicyArgs,

    /// Log output format
    #[arg(long, env = "BLOGCOP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check every repository of every allowed installation once
    Check {
        /// Report outdated articles without creating branches, pull requests or issues
        #[arg(long)]
        dry_run: bool,

        /// Print the run report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Receive GitHub push webhooks and check the pushed repository
    Serve {
        /// Address to bind to
        #[arg(long, env = "BLOGCOP_HOST", default_value = "0.0.0.0")]
        host: IpAddr,

        /// Port to listen on
        #[arg(long, env = "BLOGCOP_PORT", default_value_t = 4567)]
        port: u16,

        /// Shared secret configured on the GitHub App webhook
        #[arg(long, env = "GITHUB_WEBHOOK_SECRET", hide_env_values = true)]
        webhook_secret: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _telemetry = match telemetry::init(cli.log_format, cli.verbose) {
        Ok(telemetry) => telemetry,
        Err(e) => {
            eprintln!("blogcop: failed to initialise logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = ?e, "blogcop failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Check { dry_run, json } => {
            let config = AppConfig::from_args(&cli.github, &cli.policy, dry_run)?;
            run_check(config, json).await
        }
        Command::Serve {
            host,
            port,
            webhook_secret: secret,
        } => {
            let config = AppConfig::from_args(&cli.github, &cli.policy, false)?;
            let secret = webhook_secret(secret.as_deref())?;
            run_server(config, secret, SocketAddr::new(host, port)).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn github_app(config: &AppConfig) -> Result<GithubApp> {
    let client = RestClient::new(&config.api_url, config.request_timeout)
        .with_context(|| format!("building GitHub client for {}", config.api_url))?;
    let credentials = AppCredentials::new(&config.app_id, &config.private_key)
        .context("parsing GitHub App private key")?;
    Ok(GithubApp::new(client, credentials))
}

async fn run_check(config: AppConfig, json: bool) -> Result<ExitCode> {
    let app = github_app(&config)?;
    let run_id = CheckRunId::new_random();
    info!(
        %run_id,
        policy = %config.settings.policy,
        dry_run = config.settings.dry_run,
        "Starting batch check"
    );

    let report = BatchChecker::new(&app, &config.settings, &config.allowed_accounts)
        .run(run_id, Utc::now().date_naive())
        .await
        .context("listing GitHub App installations")?;

    log_failures(&report);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn log_failures(report: &BatchReport) {
    for failure in &report.failures {
        error!(scope = %failure.scope, reason = %failure.reason, "Check incomplete");
    }
    for repository in &report.repositories {
        if repository.failed_count() > 0 {
            error!(
                repository = %repository.repository,
                failed = repository.failed_count(),
                "Articles could not be processed"
            );
        }
    }
}

async fn run_server(config: AppConfig, secret: String, addr: SocketAddr) -> Result<()> {
    let app = github_app(&config)?;
    info!(
        main_branch = %config.settings.main_branch,
        policy = %config.settings.policy,
        "Starting webhook listener"
    );

    let main_branch = config.settings.main_branch.clone();
    let handler = Arc::new(WebhookChecker::new(app, config.settings));
    listener::serve(addr, WebhookState::new(secret, main_branch, handler))
        .await
        .with_context(|| format!("serving webhooks on {addr}"))
}
