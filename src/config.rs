//! Global configuration parsing, validation, and credential loading.
//!
//! Report rules come from an optional TOML file; endpoints and secrets are
//! read from the environment once at startup and never written back.

use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::report::filter::FilterRules;
use crate::report::pages::{MIN_BLOCKS, SLACK_BLOCK_LIMIT};
use crate::{AppError, Result};

/// Default Slack Web API base URL.
pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

/// Jira connectivity and field mapping.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields, rename_all = "snake_case")]
pub struct JiraConfig {
    /// Base URL of the Jira instance (`JIRA_URL`, populated at runtime).
    #[serde(skip)]
    pub base_url: String,
    /// Bearer token forwarded on every search (`JIRA_TOKEN`, populated at runtime).
    #[serde(skip)]
    pub token: String,
    /// Project key used in generated JQL.
    pub project: String,
    /// Number of issues requested per search page.
    pub page_size: u32,
    /// Custom field holding the secondary reviewer (QA contact).
    pub reviewer_field: String,
    /// Custom field holding linked pull request URLs.
    pub pull_request_field: String,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: String::new(),
            project: "MTV".into(),
            page_size: 100,
            reviewer_field: "customfield_12315948".into(),
            pull_request_field: "customfield_12310220".into(),
        }
    }
}

/// Slack delivery settings.
///
/// Tokens and URLs are loaded from environment variables, not from the
/// TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields, rename_all = "snake_case")]
pub struct SlackConfig {
    /// Bot user token used for `chat.postMessage` and `users.info`.
    #[serde(skip)]
    pub bot_token: String,
    /// Channel where the daily report thread is created.
    #[serde(skip)]
    pub channel_id: String,
    /// Legacy incoming webhook used when no bot token is configured.
    #[serde(skip)]
    pub webhook_url: Option<String>,
    /// Secret used to verify inbound slash command signatures.
    #[serde(skip)]
    pub signing_secret: Option<String>,
    /// Slack Web API base URL.
    pub api_base: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            channel_id: String::new(),
            webhook_url: None,
            signing_secret: None,
            api_base: DEFAULT_SLACK_API_BASE.into(),
        }
    }
}

/// Report filtering and layout rules.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields, rename_all = "snake_case")]
pub struct ReportConfig {
    /// Components that exclude an issue from the report (exact match).
    pub excluded_components: Vec<String>,
    /// Labels that exclude an issue from the report (exact match).
    pub excluded_labels: Vec<String>,
    /// Issue type treated as an umbrella; kept only when it links a PR.
    pub umbrella_type: String,
    /// Statuses for which the reviewer, not the assignee, owns the issue.
    pub reviewer_statuses: Vec<String>,
    /// Statuses fetched by the daily report and the default `/issues` view.
    pub open_statuses: Vec<String>,
    /// Preferred display order of statuses.
    pub status_order: Vec<String>,
    /// Full JQL override for the daily report.
    pub daily_jql: Option<String>,
    /// Maximum blocks per Slack message.
    pub max_blocks: usize,
    /// Pause between thread replies, in milliseconds.
    pub reply_delay_ms: u64,
    /// Summary character budget in the daily report.
    pub daily_summary_limit: usize,
    /// Summary character budget in the `/issues` view.
    pub personal_summary_limit: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            excluded_components: vec!["User Interface".into()],
            excluded_labels: vec![
                "user-interface".into(),
                "mtv-storage-offload".into(),
                "mtv-copy-offload".into(),
            ],
            umbrella_type: "Epic".into(),
            reviewer_statuses: vec!["ON_QA".into(), "MODIFIED".into()],
            open_statuses: vec!["POST".into(), "ON_QA".into(), "MODIFIED".into()],
            status_order: [
                "Open",
                "In Progress",
                "Modified",
                "Closed",
                "Archived",
                "POST",
                "ON_QA",
                "MODIFIED",
                "Verified",
                "Done",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            daily_jql: None,
            max_blocks: 48,
            reply_delay_ms: 500,
            daily_summary_limit: 200,
            personal_summary_limit: 100,
        }
    }
}

impl ReportConfig {
    /// Immutable filter rules handed to the filter and grouper.
    #[must_use]
    pub fn filter_rules(&self) -> FilterRules {
        FilterRules {
            excluded_components: self.excluded_components.iter().cloned().collect(),
            excluded_labels: self.excluded_labels.iter().cloned().collect(),
            umbrella_type: self.umbrella_type.clone(),
            reviewer_statuses: self.reviewer_statuses.iter().cloned().collect(),
            status_order: self.status_order.clone(),
        }
    }
}

/// Slash command listener settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields, rename_all = "snake_case")]
pub struct ServerConfig {
    /// Listener port (`PORT`).
    pub http_port: u16,
    /// Apply the daily report exclusions to `/issues` results.
    pub apply_daily_filters: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            apply_daily_filters: false,
        }
    }
}

/// Global configuration: TOML rules plus environment credentials.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields, rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Jira connectivity settings.
    pub jira: JiraConfig,
    /// Slack connectivity settings.
    pub slack: SlackConfig,
    /// Report rules.
    pub report: ReportConfig,
    /// Listener settings.
    pub server: ServerConfig,
}

impl GlobalConfig {
    /// Load report rules from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file cannot be read and
    /// `AppError::Config` if it contains invalid TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            AppError::Io(format!("failed to read config {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse report rules from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate_rules()?;
        Ok(config)
    }

    /// Populate endpoints and secrets from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a value is present but malformed.
    pub fn load_from_env(&mut self) -> Result<()> {
        self.load_env(|key| env::var(key).ok())
    }

    /// Populate endpoints and secrets through `lookup`.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `PORT` is not a valid port number.
    pub fn load_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        if let Some(url) = get("JIRA_URL") {
            self.jira.base_url = url.trim_end_matches('/').to_owned();
        }
        if let Some(token) = get("JIRA_TOKEN") {
            self.jira.token = token;
        }
        if let Some(token) = get("SLACK_BOT_TOKEN") {
            self.slack.bot_token = token;
        }
        if let Some(channel) = get("SLACK_CHANNEL") {
            self.slack.channel_id = channel;
        }
        if let Some(base) = get("SLACK_API_BASE") {
            self.slack.api_base = base.trim_end_matches('/').to_owned();
        }
        self.slack.webhook_url = get("SLACK_WEBHOOK_URL").or(self.slack.webhook_url.take());
        self.slack.signing_secret = get("SLACK_SIGNING_SECRET").or(self.slack.signing_secret.take());

        if let Some(port) = get("PORT") {
            self.server.http_port = port
                .parse()
                .map_err(|err| AppError::Config(format!("PORT '{port}' is invalid: {err}")))?;
        }

        Ok(())
    }

    /// Check that everything the one-shot daily report needs is present.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the missing variables.
    pub fn validate_for_batch(&self) -> Result<()> {
        self.require_jira()?;
        let has_bot = !self.slack.bot_token.is_empty() && !self.slack.channel_id.is_empty();
        if !has_bot && self.slack.webhook_url.is_none() {
            return Err(AppError::Config(
                "set SLACK_BOT_TOKEN and SLACK_CHANNEL, or SLACK_WEBHOOK_URL".into(),
            ));
        }
        Ok(())
    }

    /// Check that everything the slash command listener needs is present.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the missing variables.
    pub fn validate_for_server(&self) -> Result<()> {
        self.require_jira()?;
        if self.slack.bot_token.is_empty() {
            return Err(AppError::Config("SLACK_BOT_TOKEN must be set".into()));
        }
        Ok(())
    }

    fn require_jira(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.jira.base_url.is_empty() {
            missing.push("JIRA_URL");
        }
        if self.jira.token.is_empty() {
            missing.push("JIRA_TOKEN");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )))
        }
    }

    fn validate_rules(&self) -> Result<()> {
        if self.jira.page_size == 0 {
            return Err(AppError::Config("jira.page_size must be greater than zero".into()));
        }
        if !(MIN_BLOCKS..=SLACK_BLOCK_LIMIT).contains(&self.report.max_blocks) {
            return Err(AppError::Config(format!(
                "report.max_blocks must be between {MIN_BLOCKS} and {SLACK_BLOCK_LIMIT}"
            )));
        }
        if self.report.open_statuses.is_empty() {
            return Err(AppError::Config("report.open_statuses must not be empty".into()));
        }
        Ok(())
    }
}
