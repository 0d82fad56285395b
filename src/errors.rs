//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Longest slice of a remote error body kept in error messages.
const ERROR_BODY_LIMIT: usize = 512;

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
///
/// Nothing is retried: every variant is terminal for the pipeline run
/// that produced it, except [`AppError::NoMatch`] which is reported to
/// the caller as an informational message.
#[derive(Debug)]
pub enum AppError {
    /// Missing or invalid configuration value.
    Config(String),
    /// HTTP call failed to complete or timed out.
    Transport(String),
    /// Remote service answered with a non-success status or `ok: false`.
    Remote(String),
    /// Response body was not valid JSON or lacked an expected field.
    Decode(String),
    /// Filtering produced zero items for the requested scope.
    NoMatch(String),
    /// Inbound request failed signature verification.
    Unauthorized(String),
    /// Socket or file-system operation failure.
    Io(String),
}

impl AppError {
    /// Whether the error is an informational outcome rather than a failure.
    #[must_use]
    pub fn is_no_match(&self) -> bool {
        matches!(self, Self::NoMatch(_))
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::Remote(msg) => write!(f, "remote: {msg}"),
            Self::Decode(msg) => write!(f, "decode: {msg}"),
            Self::NoMatch(msg) => write!(f, "no match: {msg}"),
            Self::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Clip a remote response body before embedding it in an error message.
pub(crate) fn truncate_for_error(body: &str) -> &str {
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
