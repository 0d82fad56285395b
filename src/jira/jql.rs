//! JQL query builders.
//!
//! User filtering for `/issues` happens after the fetch, against display
//! names, so none of these queries mention a person.

use crate::config::{JiraConfig, ReportConfig};

fn open_clause(jira: &JiraConfig, report: &ReportConfig) -> String {
    format!(
        "project = {} AND (status IN ({}) OR (type = {} AND status != Closed))",
        jira.project,
        report.open_statuses.join(", "),
        report.umbrella_type,
    )
}

/// Query for the daily report: active statuses plus open umbrella issues.
#[must_use]
pub fn daily_report(jira: &JiraConfig, report: &ReportConfig) -> String {
    report
        .daily_jql
        .clone()
        .unwrap_or_else(|| format!("{} ORDER BY assignee", open_clause(jira, report)))
}

/// Query for the `/issues` command.
///
/// With `include_all` every status in the project is fetched.
#[must_use]
pub fn personal(jira: &JiraConfig, report: &ReportConfig, include_all: bool) -> String {
    if include_all {
        format!("project = {} ORDER BY status ASC, updated DESC", jira.project)
    } else {
        format!("{} ORDER BY status ASC", open_clause(jira, report))
    }
}
