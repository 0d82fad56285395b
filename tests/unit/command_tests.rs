//! Slash command parsing and the immediate acknowledgement.

use jira_slack_digest::report::personal::CommandJob;
use jira_slack_digest::slack::commands::{acknowledgement, parse_command_text, SlashCommand};
use serde_json::json;

#[test]
fn all_flag_first_then_name() {
    let parsed = parse_command_text("--all John Doe");
    assert!(parsed.include_all);
    assert_eq!(parsed.username.as_deref(), Some("John Doe"));
}

#[test]
fn all_flag_position_does_not_matter() {
    for text in ["John Doe --all", "John --all Doe", "  --all   John   Doe  "] {
        let parsed = parse_command_text(text);
        assert!(parsed.include_all, "{text}");
        assert_eq!(parsed.username.as_deref(), Some("John Doe"), "{text}");
    }
}

#[test]
fn name_without_flag() {
    let parsed = parse_command_text("Jane Doe");
    assert!(!parsed.include_all);
    assert_eq!(parsed.username.as_deref(), Some("Jane Doe"));
}

#[test]
fn repeated_flag_is_removed_everywhere() {
    let parsed = parse_command_text("--all Jane --all");
    assert!(parsed.include_all);
    assert_eq!(parsed.username.as_deref(), Some("Jane"));
}

#[test]
fn acknowledgement_is_ephemeral_text() {
    let body = serde_json::to_value(acknowledgement()).expect("serialize");
    assert_eq!(
        body,
        json!({
            "response_type": "ephemeral",
            "text": "\u{1f50d} Fetching your JIRA issues...",
        })
    );
}

#[test]
fn job_captures_reply_target_and_arguments() {
    let command = SlashCommand {
        user_id: "U123".into(),
        user_name: "jdoe".into(),
        command: "/issues".into(),
        text: "--all".into(),
        response_url: "https://hooks.slack.com/commands/T/1/abc".into(),
        ..SlashCommand::default()
    };
    let first = CommandJob::from_command(command.clone());
    let second = CommandJob::from_command(command);

    assert_eq!(first.user_id, "U123");
    assert_eq!(first.response_url, "https://hooks.slack.com/commands/T/1/abc");
    assert!(first.command.include_all);
    assert_eq!(first.command.username, None);
    assert_ne!(first.job_id, second.job_id);
}
