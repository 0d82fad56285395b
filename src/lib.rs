#![forbid(unsafe_code)]

//! Jira issue digests for Slack.
//!
//! Two entry points share one pipeline: the daily batch report posted as a
//! channel thread, and the `/issues` slash command answered privately.

pub mod config;
pub mod errors;
pub mod jira;
pub mod report;
pub mod server;
pub mod slack;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
