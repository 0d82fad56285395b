//! HTTP endpoint for the `/issues` slash command.
//!
//! `POST /slack/issues` verifies the Slack signature, acknowledges within
//! the three second window, and builds the reply on a background task.
//! `GET /health` answers `OK`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::config::GlobalConfig;
use crate::report::personal::{CommandJob, PersonalReporter};
use crate::slack::commands::{acknowledgement, SlashCommand};
use crate::slack::signature::{self, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::{AppError, Result};

/// Slash command bodies are small; anything larger is rejected.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Effective configuration.
    pub config: Arc<GlobalConfig>,
    /// Background job runner.
    pub reporter: PersonalReporter,
    /// In-flight slash command jobs.
    pub jobs: TaskTracker,
}

impl AppState {
    /// Build the state and its clients from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a client cannot be constructed.
    pub fn new(config: Arc<GlobalConfig>) -> Result<Self> {
        Ok(Self {
            reporter: PersonalReporter::new(Arc::clone(&config))?,
            config,
            jobs: TaskTracker::new(),
        })
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn issues(State(state): State<AppState>, Form(command): Form<SlashCommand>) -> Response {
    let job = CommandJob::from_command(command);
    info!(
        job_id = %job.job_id,
        user_id = %job.user_id,
        user_name = %job.user_name,
        "slash command accepted"
    );

    if job.response_url.is_empty() {
        warn!(job_id = %job.job_id, "slash command without response_url; nothing to reply to");
    } else {
        let reporter = state.reporter.clone();
        state.jobs.spawn(async move {
            reporter.run(job).await;
        });
    }

    Json(acknowledgement()).into_response()
}

/// Reject requests whose Slack signature does not verify.
///
/// Passes everything through when no signing secret is configured.
async fn verify_signature(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(secret) = state.config.slack.signing_secret.as_deref() else {
        return next.run(request).await;
    };

    let (parts, body) = request.into_parts();
    let Ok(bytes) = to_bytes(body, MAX_BODY_BYTES).await else {
        return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
    };

    let now = chrono::Utc::now().timestamp();
    if let Err(err) = signature::verify(
        secret,
        header_str(&parts.headers, TIMESTAMP_HEADER),
        header_str(&parts.headers, SIGNATURE_HEADER),
        &bytes,
        now,
    ) {
        warn!(%err, path = %parts.uri.path(), "rejected unsigned slack request");
        return (StatusCode::UNAUTHORIZED, "invalid request signature").into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

/// Routes for the slash command server.
#[must_use]
pub fn router(state: AppState) -> Router {
    let slash = Router::new()
        .route("/slack/issues", post(issues))
        .route_layer(middleware::from_fn_with_state(state.clone(), verify_signature));

    Router::new()
        .merge(slash)
        .route("/health", get(health))
        .with_state(state)
}

/// Serve on `server.http_port` until `ct` is cancelled, then wait for
/// in-flight jobs to send their replies.
///
/// # Errors
///
/// Returns `AppError::Config` if the listener cannot bind or the server
/// fails.
pub async fn serve_http(state: AppState, ct: CancellationToken) -> Result<()> {
    let bind = SocketAddr::from(([0, 0, 0, 0], state.config.server.http_port));
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind http on {bind}: {err}")))?;
    info!(%bind, "slash command server listening");
    if state.config.slack.signing_secret.is_none() {
        warn!("no slack signing secret configured; request signatures are not verified");
    }

    serve_on(listener, state, ct).await
}

/// Serve on an already-bound listener.
///
/// # Errors
///
/// Returns `AppError::Config` if the server fails.
pub async fn serve_on(
    listener: tokio::net::TcpListener,
    state: AppState,
    ct: CancellationToken,
) -> Result<()> {
    let jobs = state.jobs.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Config(format!("http server error: {err}")))?;

    jobs.close();
    info!(pending = jobs.len(), "waiting for in-flight slash commands");
    jobs.wait().await;
    info!("slash command server shut down");
    Ok(())
}
