#![forbid(unsafe_code)]

//! `jira-slack-digest` binary.
//!
//! Runs the daily channel report once, or with `--server` listens for the
//! `/issues` slash command until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use jira_slack_digest::config::GlobalConfig;
use jira_slack_digest::report::daily::{sink_from_config, DailyReport};
use jira_slack_digest::server::{serve_http, AppState};
use jira_slack_digest::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "jira-slack-digest", about = "Jira issue digests for Slack", version, long_about = None)]
struct Cli {
    /// Listen for the `/issues` slash command instead of posting the daily report.
    #[arg(long)]
    server: bool,

    /// Optional TOML file with report rules.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
        .inspect_err(|err| error!(%err, "jira-slack-digest failed"))
}

async fn run(args: Cli) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };
    config.load_from_env()?;
    info!(
        project = %config.jira.project,
        server = args.server,
        "configuration loaded"
    );

    if args.server {
        run_server(config).await
    } else {
        run_daily(&config).await
    }
}

async fn run_daily(config: &GlobalConfig) -> Result<()> {
    config.validate_for_batch()?;
    let sink = sink_from_config(config)?;
    let report = DailyReport::new(config)?;

    let date = chrono::Local::now().format("%b %-d, %Y").to_string();
    let summary = report.run(sink.as_ref(), &date).await?;
    info!(
        fetched = summary.fetched,
        reported = summary.reported,
        replies = summary.replies,
        "daily report delivered"
    );
    Ok(())
}

async fn run_server(config: GlobalConfig) -> Result<()> {
    config.validate_for_server()?;
    let state = AppState::new(Arc::new(config))?;

    let ct = CancellationToken::new();
    let server_ct = ct.clone();
    let mut server = tokio::spawn(async move { serve_http(state, server_ct).await });

    tokio::select! {
        () = shutdown_signal() => {
            info!("shutdown signal received");
            ct.cancel();
        }
        joined = &mut server => return flatten(joined),
    }

    flatten(server.await)
}

fn flatten(joined: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    joined.map_err(|err| AppError::Config(format!("http server task failed: {err}")))?
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
