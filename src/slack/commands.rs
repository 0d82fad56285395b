//! `/issues` slash command payload and argument parsing.

use serde::Deserialize;

use crate::slack::webhook::WebhookMessage;

/// Token that widens the query to every status.
pub const ALL_FLAG: &str = "--all";

/// Form fields Slack posts to a slash command endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SlashCommand {
    /// Deprecated verification token.
    pub token: String,
    /// Workspace id.
    pub team_id: String,
    /// Workspace domain.
    pub team_domain: String,
    /// Channel the command was issued in.
    pub channel_id: String,
    /// Channel name.
    pub channel_name: String,
    /// Invoking user id.
    pub user_id: String,
    /// Invoking user handle.
    pub user_name: String,
    /// Command name, e.g. `/issues`.
    pub command: String,
    /// Free text after the command.
    pub text: String,
    /// URL accepting delayed replies for this invocation.
    pub response_url: String,
}

/// Arguments extracted from the command text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Person to report on; `None` means the caller.
    pub username: Option<String>,
    /// Whether `--all` was given.
    pub include_all: bool,
}

/// Split command text into an optional name and the `--all` toggle.
///
/// The flag may appear anywhere; it is removed and the remaining words are
/// joined with single spaces.
#[must_use]
pub fn parse_command_text(text: &str) -> ParsedCommand {
    let mut include_all = false;
    let words: Vec<&str> = text
        .split_whitespace()
        .filter(|word| {
            let is_flag = *word == ALL_FLAG;
            include_all |= is_flag;
            !is_flag
        })
        .collect();

    let name = words.join(" ");
    ParsedCommand {
        username: (!name.is_empty()).then_some(name),
        include_all,
    }
}

/// Immediate reply returned before the report is built.
#[must_use]
pub fn acknowledgement() -> WebhookMessage {
    WebhookMessage::ephemeral_text("\u{1f50d} Fetching your JIRA issues...")
}
