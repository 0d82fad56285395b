//! Jira search pagination and failure handling against a mock server.

use httpmock::prelude::*;
use jira_slack_digest::jira::JiraClient;
use jira_slack_digest::AppError;
use serde_json::json;

use super::test_helpers::{jira_issue, search_page, test_config};

fn client(server: &MockServer, page_size: u32) -> JiraClient {
    let mut config = test_config(&server.base_url(), &server.base_url());
    config.jira.page_size = page_size;
    JiraClient::new(&config.jira).expect("jira client")
}

#[tokio::test]
async fn search_follows_pages_until_total() {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/api/2/search")
            .header("authorization", "Bearer jira-token")
            .json_body_includes(json!({ "startAt": 0, "maxResults": 2 }).to_string());
        then.status(200).json_body(search_page(
            0,
            3,
            vec![
                jira_issue("MTV-1", "POST", Some("Ann")),
                jira_issue("MTV-2", "ON_QA", Some("Bob")),
            ],
        ));
    });
    let second = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/api/2/search")
            .json_body_includes(json!({ "startAt": 2 }).to_string());
        then.status(200)
            .json_body(search_page(2, 3, vec![jira_issue("MTV-3", "MODIFIED", None)]));
    });

    let records = client(&server, 2)
        .search("project = MTV")
        .await
        .expect("search");

    let keys: Vec<_> = records.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["MTV-1", "MTV-2", "MTV-3"]);
    assert_eq!(records[2].assignee, None);
    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 1);
}

#[tokio::test]
async fn search_sends_jql_and_custom_fields() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/api/2/search")
            .body_includes("project = MTV ORDER BY status ASC")
            .body_includes("customfield_12315948")
            .body_includes("customfield_12310220");
        then.status(200).json_body(search_page(0, 0, Vec::new()));
    });

    let records = client(&server, 100)
        .search("project = MTV ORDER BY status ASC")
        .await
        .expect("search");

    assert!(records.is_empty());
    mock.assert();
}

#[tokio::test]
async fn search_is_idempotent_for_unchanged_results() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/rest/api/2/search");
        then.status(200).json_body(search_page(
            0,
            2,
            vec![
                jira_issue("MTV-1", "POST", Some("Ann")),
                jira_issue("MTV-2", "POST", Some("Ann")),
            ],
        ));
    });

    let client = client(&server, 100);
    let first = client.search("project = MTV").await.expect("first");
    let second = client.search("project = MTV").await.expect("second");
    assert_eq!(first, second);
}

#[tokio::test]
async fn non_success_status_is_remote_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/rest/api/2/search");
        then.status(401).body("unauthorized");
    });

    let err = client(&server, 100)
        .search("project = MTV")
        .await
        .expect_err("401");
    assert!(matches!(err, AppError::Remote(_)));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/rest/api/2/search");
        then.status(200).body("<html>login</html>");
    });

    let err = client(&server, 100)
        .search("project = MTV")
        .await
        .expect_err("html");
    assert!(matches!(err, AppError::Decode(_)));
}

#[tokio::test]
async fn failed_later_page_fails_whole_search() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/rest/api/2/search")
            .json_body_includes(json!({ "startAt": 0 }).to_string());
        then.status(200)
            .json_body(search_page(0, 2, vec![jira_issue("MTV-1", "POST", None)]));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/rest/api/2/search")
            .json_body_includes(json!({ "startAt": 1 }).to_string());
        then.status(500).body("boom");
    });

    let err = client(&server, 1)
        .search("project = MTV")
        .await
        .expect_err("second page fails");
    assert!(matches!(err, AppError::Remote(_)));
}

#[tokio::test]
async fn empty_page_before_total_ends_search() {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/api/2/search")
            .json_body_includes(json!({ "startAt": 0 }).to_string());
        then.status(200).json_body(search_page(
            0,
            3,
            vec![
                jira_issue("MTV-1", "POST", Some("Ann")),
                jira_issue("MTV-2", "POST", Some("Bob")),
            ],
        ));
    });
    let later = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/api/2/search")
            .json_body_includes(json!({ "startAt": 2 }).to_string());
        then.status(200).json_body(search_page(2, 3, Vec::new()));
    });

    let records = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        client(&server, 2).search("project = MTV"),
    )
    .await
    .expect("search terminates")
    .expect("search");

    assert_eq!(records.len(), 2);
    assert_eq!(first.calls(), 1);
    assert_eq!(later.calls(), 1);
}

#[tokio::test]
async fn page_without_start_at_is_decode_error() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/rest/api/2/search");
        then.status(200).json_body(json!({
            "total": 3,
            "issues": [jira_issue("MTV-1", "POST", Some("Ann"))],
        }));
    });

    let err = client(&server, 1)
        .search("project = MTV")
        .await
        .expect_err("missing startAt");

    assert!(matches!(err, AppError::Decode(_)));
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let mut config = test_config("http://127.0.0.1:1", "http://127.0.0.1:1");
    config.jira.page_size = 10;
    let client = JiraClient::new(&config.jira).expect("client");

    let err = client.search("project = MTV").await.expect_err("refused");
    assert!(matches!(err, AppError::Transport(_)));
}

#[test]
fn field_map_uses_configured_ids() {
    let mut config = test_config("https://j", "https://s");
    config.jira.reviewer_field = "customfield_1".into();
    let client = JiraClient::new(&config.jira).expect("client");
    assert_eq!(client.field_map().reviewer, "customfield_1");
}
