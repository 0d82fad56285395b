//! `/issues` flow: resolve the caller, fetch, filter by name, and answer
//! privately through the command's `response_url`.

use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::filter::{FilterMode, ReportFilter};
use super::pages::{single_message, PageBlock};
use super::{count_items, StatusGroup};
use crate::config::GlobalConfig;
use crate::jira::{jql, JiraClient, Record};
use crate::slack::blocks::{BlockRenderer, ItemStyle};
use crate::slack::client::SlackApiClient;
use crate::slack::commands::{parse_command_text, ParsedCommand, SlashCommand};
use crate::slack::webhook::{WebhookClient, WebhookMessage};
use crate::{AppError, Result};

/// Reply used when the caller's Slack name cannot be resolved.
pub const NAME_DETECTION_FAILED: &str =
    "Failed to auto-detect your name.\n\nPlease specify a name: `/issues John Doe`";

/// One accepted slash command, queued for background processing.
#[derive(Debug, Clone)]
pub struct CommandJob {
    /// Correlates the log lines of one invocation.
    pub job_id: Uuid,
    /// Invoking Slack user id.
    pub user_id: String,
    /// Invoking Slack handle.
    pub user_name: String,
    /// Where the private reply goes.
    pub response_url: String,
    /// Parsed command arguments.
    pub command: ParsedCommand,
}

impl CommandJob {
    /// Capture what the background job needs from the request.
    #[must_use]
    pub fn from_command(command: SlashCommand) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            command: parse_command_text(&command.text),
            user_id: command.user_id,
            user_name: command.user_name,
            response_url: command.response_url,
        }
    }
}

/// How a job ended. Every outcome has already been reported to the caller,
/// unless the reply itself failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The issue list was sent.
    Delivered {
        /// Items matching the name.
        items: usize,
    },
    /// Nothing matched the name.
    NoMatch,
    /// Name lookup or fetch failed; the error text was sent.
    Failed(String),
}

/// Builds and sends personal issue views.
#[derive(Clone)]
pub struct PersonalReporter {
    config: Arc<GlobalConfig>,
    jira: JiraClient,
    directory: SlackApiClient,
    responder: WebhookClient,
    filter: ReportFilter,
    renderer: BlockRenderer,
}

impl PersonalReporter {
    /// Build the reporter from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if an HTTP client cannot be built.
    pub fn new(config: Arc<GlobalConfig>) -> Result<Self> {
        Ok(Self {
            jira: JiraClient::new(&config.jira)?,
            directory: SlackApiClient::new(&config.slack)?,
            responder: WebhookClient::new(),
            filter: ReportFilter::new(config.report.filter_rules()),
            renderer: BlockRenderer::new(
                &config.jira.base_url,
                config.report.personal_summary_limit,
                ItemStyle::Personal,
            ),
            config,
        })
    }

    /// Process one job and reply to its `response_url`.
    pub async fn run(&self, job: CommandJob) -> JobOutcome {
        let span = info_span!(
            "slash_command",
            job_id = %job.job_id,
            user_id = %job.user_id,
            include_all = job.command.include_all,
        );
        async move {
            let (outcome, message) = self.build_reply(&job).await;
            if let Err(err) = self.responder.post(&job.response_url, &message).await {
                warn!(%err, "failed to deliver slash command reply");
            }
            info!(?outcome, "slash command finished");
            outcome
        }
        .instrument(span)
        .await
    }

    async fn build_reply(&self, job: &CommandJob) -> (JobOutcome, WebhookMessage) {
        let username = match &job.command.username {
            Some(name) => name.clone(),
            None => match self.directory.user_display_name(&job.user_id).await {
                Ok(name) => {
                    info!(%name, "resolved caller name from slack");
                    name
                }
                Err(err) => {
                    warn!(%err, user_name = %job.user_name, "slack name lookup failed");
                    return failure(NAME_DETECTION_FAILED.to_owned());
                }
            },
        };

        let query = jql::personal(&self.config.jira, &self.config.report, job.command.include_all);
        let records = match self.jira.search(&query).await {
            Ok(records) => records,
            Err(err) => {
                warn!(%err, "jira fetch failed");
                return failure(format!("Failed to fetch JIRA issues: {err}"));
            }
        };

        let groups = match self.matching_groups(&records, &username) {
            Ok(groups) => groups,
            Err(err) => {
                info!(%err, fetched = records.len(), "no issues matched");
                return (
                    JobOutcome::NoMatch,
                    error_reply(&format!(
                        "No issues found for: *{username}*\n\nMake sure the name matches exactly as it appears in JIRA."
                    )),
                );
            }
        };

        let items = count_items(&groups);
        let page = single_message(
            lead_blocks(&username, job.command.include_all, &groups),
            &groups,
            self.config.report.max_blocks,
        );
        info!(%username, items, blocks = page.len(), "personal view built");
        (
            JobOutcome::Delivered { items },
            WebhookMessage::ephemeral_blocks(self.renderer.render_page(&page)),
        )
    }

    /// Records matching `username`, grouped by status.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NoMatch` when nothing matches.
    pub fn matching_groups(&self, records: &[Record], username: &str) -> Result<Vec<StatusGroup>> {
        let mode = if self.config.server.apply_daily_filters {
            FilterMode::DailyReport
        } else {
            FilterMode::IncludeEverything
        };
        let groups = self.filter.filter_for_user(records, username, mode);
        if groups.is_empty() {
            return Err(AppError::NoMatch(format!("no issues for {username}")));
        }
        Ok(groups)
    }
}

/// Title, per-status summary, and divider heading a personal view.
#[must_use]
pub fn lead_blocks(username: &str, include_all: bool, groups: &[StatusGroup]) -> Vec<PageBlock> {
    let title = if include_all {
        format!("\u{1f50d} All Issues for {username}")
    } else {
        format!("\u{1f50d} Issues for {username}")
    };
    vec![
        PageBlock::Title(title),
        PageBlock::Summary {
            total: count_items(groups),
            statuses: groups
                .iter()
                .map(|group| (group.status.clone(), group.items.len()))
                .collect(),
        },
        PageBlock::Divider,
    ]
}

fn failure(text: String) -> (JobOutcome, WebhookMessage) {
    let message = error_reply(&text);
    (JobOutcome::Failed(text), message)
}

/// Private error reply, prefixed with a cross mark.
#[must_use]
pub fn error_reply(text: &str) -> WebhookMessage {
    WebhookMessage::ephemeral_text(format!("\u{274c} {text}"))
}
