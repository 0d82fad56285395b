//! TOML rule parsing, environment loading, and mode validation.

use std::collections::HashMap;

use jira_slack_digest::config::{GlobalConfig, DEFAULT_SLACK_API_BASE};
use jira_slack_digest::AppError;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

fn loaded(pairs: &[(&str, &str)]) -> GlobalConfig {
    let mut config = GlobalConfig::default();
    config.load_env(env(pairs)).expect("load env");
    config
}

#[test]
fn defaults_match_mtv_report() {
    let config = GlobalConfig::default();
    assert_eq!(config.jira.project, "MTV");
    assert_eq!(config.jira.page_size, 100);
    assert_eq!(config.jira.reviewer_field, "customfield_12315948");
    assert_eq!(config.jira.pull_request_field, "customfield_12310220");
    assert_eq!(config.report.excluded_components, vec!["User Interface"]);
    assert_eq!(config.report.max_blocks, 48);
    assert_eq!(config.report.reply_delay_ms, 500);
    assert_eq!(config.report.daily_summary_limit, 200);
    assert_eq!(config.report.personal_summary_limit, 100);
    assert_eq!(config.server.http_port, 8080);
    assert!(!config.server.apply_daily_filters);
    assert_eq!(config.slack.api_base, DEFAULT_SLACK_API_BASE);
}

#[test]
fn toml_overrides_selected_rules() {
    let config = GlobalConfig::from_toml_str(
        r#"
[jira]
project = "FOO"
page_size = 50

[report]
excluded_labels = ["skip-me"]
max_blocks = 20

[server]
apply_daily_filters = true
"#,
    )
    .expect("parse");

    assert_eq!(config.jira.project, "FOO");
    assert_eq!(config.jira.page_size, 50);
    assert_eq!(config.report.excluded_labels, vec!["skip-me"]);
    assert_eq!(config.report.excluded_components, vec!["User Interface"]);
    assert_eq!(config.report.max_blocks, 20);
    assert!(config.server.apply_daily_filters);
}

#[test]
fn toml_rejects_unknown_keys() {
    let err = GlobalConfig::from_toml_str("[report]\nmystery = 1\n").expect_err("unknown key");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn toml_cannot_carry_secrets() {
    assert!(GlobalConfig::from_toml_str("[jira]\ntoken = \"leak\"\n").is_err());
}

#[test]
fn toml_rejects_unusable_limits() {
    assert!(GlobalConfig::from_toml_str("[jira]\npage_size = 0\n").is_err());
    assert!(GlobalConfig::from_toml_str("[report]\nmax_blocks = 3\n").is_err());
    assert!(GlobalConfig::from_toml_str("[report]\nopen_statuses = []\n").is_err());
}

#[test]
fn max_blocks_cannot_exceed_slack_message_limit() {
    let err = GlobalConfig::from_toml_str("[report]\nmax_blocks = 200\n").expect_err("too many");
    assert!(matches!(err, AppError::Config(_)));
    assert!(GlobalConfig::from_toml_str("[report]\nmax_blocks = 51\n").is_err());

    let config = GlobalConfig::from_toml_str("[report]\nmax_blocks = 50\n").expect("at limit");
    assert_eq!(config.report.max_blocks, 50);
}

#[test]
fn load_from_path_reads_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("digest.toml");
    std::fs::write(&path, "[report]\nreply_delay_ms = 0\n").expect("write");

    let config = GlobalConfig::load_from_path(&path).expect("load");
    assert_eq!(config.report.reply_delay_ms, 0);
}

#[test]
fn load_from_missing_path_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = GlobalConfig::load_from_path(dir.path().join("absent.toml")).expect_err("missing");
    assert!(matches!(err, AppError::Io(_)));
}

#[test]
fn env_populates_endpoints_and_secrets() {
    let config = loaded(&[
        ("JIRA_URL", "https://jira.example.com/"),
        ("JIRA_TOKEN", " tok "),
        ("SLACK_BOT_TOKEN", "xoxb-1"),
        ("SLACK_CHANNEL", "C123"),
        ("SLACK_SIGNING_SECRET", "shh"),
        ("SLACK_API_BASE", "http://127.0.0.1:9999/api/"),
        ("PORT", "3000"),
    ]);

    assert_eq!(config.jira.base_url, "https://jira.example.com");
    assert_eq!(config.jira.token, "tok");
    assert_eq!(config.slack.bot_token, "xoxb-1");
    assert_eq!(config.slack.channel_id, "C123");
    assert_eq!(config.slack.signing_secret.as_deref(), Some("shh"));
    assert_eq!(config.slack.api_base, "http://127.0.0.1:9999/api");
    assert_eq!(config.server.http_port, 3000);
}

#[test]
fn empty_env_values_are_unset() {
    let config = loaded(&[("SLACK_WEBHOOK_URL", "  "), ("SLACK_SIGNING_SECRET", "")]);
    assert_eq!(config.slack.webhook_url, None);
    assert_eq!(config.slack.signing_secret, None);
}

#[test]
fn invalid_port_is_config_error() {
    let mut config = GlobalConfig::default();
    let err = config.load_env(env(&[("PORT", "eighty")])).expect_err("bad port");
    assert!(err.to_string().contains("PORT"));
}

#[test]
fn batch_requires_jira_credentials() {
    let err = loaded(&[("SLACK_WEBHOOK_URL", "https://hooks")])
        .validate_for_batch()
        .expect_err("missing jira");
    assert_eq!(
        err.to_string(),
        "config: missing required environment variables: JIRA_URL, JIRA_TOKEN"
    );
}

#[test]
fn batch_accepts_bot_or_webhook() {
    let jira = [("JIRA_URL", "https://j"), ("JIRA_TOKEN", "t")];

    let mut with_bot = jira.to_vec();
    with_bot.extend([("SLACK_BOT_TOKEN", "xoxb"), ("SLACK_CHANNEL", "C1")]);
    assert!(loaded(&with_bot).validate_for_batch().is_ok());

    let mut with_hook = jira.to_vec();
    with_hook.push(("SLACK_WEBHOOK_URL", "https://hooks"));
    assert!(loaded(&with_hook).validate_for_batch().is_ok());

    let mut bot_without_channel = jira.to_vec();
    bot_without_channel.push(("SLACK_BOT_TOKEN", "xoxb"));
    assert!(loaded(&bot_without_channel).validate_for_batch().is_err());
}

#[test]
fn server_requires_bot_token() {
    let base = [("JIRA_URL", "https://j"), ("JIRA_TOKEN", "t")];
    assert!(loaded(&base).validate_for_server().is_err());

    let mut with_bot = base.to_vec();
    with_bot.push(("SLACK_BOT_TOKEN", "xoxb"));
    assert!(loaded(&with_bot).validate_for_server().is_ok());
}

#[test]
fn filter_rules_mirror_report_config() {
    let config = GlobalConfig::default();
    let rules = config.report.filter_rules();
    assert!(rules.excluded_labels.contains("mtv-storage-offload"));
    assert!(rules.reviewer_statuses.contains("ON_QA"));
    assert_eq!(rules.status_order.first().map(String::as_str), Some("Open"));
}
