//! Shared fixtures for integration tests.

use jira_slack_digest::config::GlobalConfig;
use serde_json::{json, Value};

/// Configuration wired to mock Jira and Slack servers, with no reply delay.
pub fn test_config(jira_base: &str, slack_base: &str) -> GlobalConfig {
    let mut config = GlobalConfig::default();
    config.jira.base_url = jira_base.trim_end_matches('/').to_owned();
    config.jira.token = "jira-token".into();
    config.slack.bot_token = "xoxb-test".into();
    config.slack.channel_id = "C_REPORT".into();
    config.slack.api_base = slack_base.trim_end_matches('/').to_owned();
    config.report.reply_delay_ms = 0;
    config
}

/// One raw Jira issue as the search API returns it.
pub fn jira_issue(key: &str, status: &str, assignee: Option<&str>) -> Value {
    json!({
        "key": key,
        "fields": {
            "summary": format!("Summary of {key}"),
            "status": { "name": status },
            "assignee": assignee.map(|name| json!({ "displayName": name })),
            "issuetype": { "name": "Bug" },
            "components": [],
            "labels": [],
            "customfield_12310220": null,
        }
    })
}

/// A search response page.
pub fn search_page(start_at: usize, total: usize, issues: Vec<Value>) -> Value {
    json!({
        "startAt": start_at,
        "maxResults": issues.len(),
        "total": total,
        "issues": issues,
    })
}
