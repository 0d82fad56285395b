//! Block Kit rendering: escaping, truncation, and item line layout.

use jira_slack_digest::report::pages::{Page, PageBlock};
use jira_slack_digest::report::Item;
use jira_slack_digest::slack::blocks::{
    escape_mrkdwn, pr_links, report_title_blocks, truncate_chars, BlockRenderer, ItemStyle,
};
use serde_json::Value;

fn item(summary: &str, links: Vec<String>) -> Item {
    Item {
        key: "MTV-12".into(),
        summary: summary.into(),
        status: "ON_QA".into(),
        links,
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).expect("serialize block")
}

#[test]
fn escape_replaces_control_characters() {
    assert_eq!(escape_mrkdwn("<a&b>"), "&lt;a&amp;b&gt;");
    assert_eq!(escape_mrkdwn("plain text"), "plain text");
}

#[test]
fn rendering_twice_does_not_double_escape() {
    let renderer = BlockRenderer::new("https://jira.example.com", 200, ItemStyle::Daily);
    let item = item("<a&b>", Vec::new());

    let first = renderer.item_text(&item);
    let second = renderer.item_text(&item);
    assert_eq!(first, second);
    assert!(first.contains("&lt;a&amp;b&gt;"));
    assert!(!first.contains("&amp;amp;"));
}

#[test]
fn truncate_appends_ellipsis_only_when_shortened() {
    assert_eq!(truncate_chars("abcdef", 3), "abc...");
    assert_eq!(truncate_chars("abc", 3), "abc");
    assert_eq!(truncate_chars("", 3), "");
}

#[test]
fn pr_links_are_numbered_or_dash() {
    assert_eq!(pr_links(&[]), "\u{2013}");
    assert_eq!(
        pr_links(&["https://a/1".into(), "https://a/2".into()]),
        "<https://a/1|PR1> <https://a/2|PR2>"
    );
}

#[test]
fn daily_item_line_layout() {
    let renderer = BlockRenderer::new("https://jira.example.com/", 200, ItemStyle::Daily);
    let text = renderer.item_text(&item("Fix it", vec!["https://gh/pull/3".into()]));
    assert_eq!(
        text,
        "<https://jira.example.com/browse/MTV-12|*MTV-12*> \u{2014} Fix it\nStatus: *ON_QA* | PR: <https://gh/pull/3|PR1>"
    );
}

#[test]
fn personal_item_line_layout() {
    let renderer = BlockRenderer::new("https://jira.example.com", 100, ItemStyle::Personal);
    let text = renderer.item_text(&item("Fix it", Vec::new()));
    assert_eq!(
        text,
        "\u{2022} <https://jira.example.com/browse/MTV-12|*MTV-12*> \u{2014} Fix it\n   *Status:* ON_QA  |  *PR:* \u{2013}"
    );
}

#[test]
fn summary_is_cut_to_limit_before_escaping() {
    let renderer = BlockRenderer::new("https://j", 5, ItemStyle::Daily);
    let text = renderer.item_text(&item("a&b&c&d", Vec::new()));
    assert!(text.contains("a&amp;b&amp;c..."));
}

#[test]
fn page_renders_to_section_and_divider_json() {
    let renderer = BlockRenderer::new("https://j", 200, ItemStyle::Daily);
    let page = Page::new(vec![
        PageBlock::PersonHeader {
            name: "Jane <Doe>".into(),
            continued: true,
        },
        PageBlock::StatusHeader {
            status: "POST".into(),
            count: 4,
            continued: false,
        },
        PageBlock::Item(item("Fix", Vec::new())),
        PageBlock::Truncated { remaining: 2 },
        PageBlock::PageBreak,
    ]);

    let blocks = to_json(&renderer.render_page(&page));
    let blocks = blocks.as_array().expect("array");
    assert_eq!(blocks.len(), 5);

    assert_eq!(blocks[0]["type"], "section");
    assert_eq!(blocks[0]["text"]["type"], "mrkdwn");
    assert_eq!(blocks[0]["text"]["text"], "*\u{1f464} Jane &lt;Doe&gt;* (continued)");
    assert_eq!(blocks[1]["text"]["text"], "\u{1f4c2} *POST* (4)");
    assert_eq!(blocks[3]["text"]["text"], "_...and 2 more issue(s) not shown_");
    assert_eq!(blocks[4]["type"], "divider");
}

#[test]
fn title_and_summary_render_as_header_and_section() {
    let renderer = BlockRenderer::new("https://j", 100, ItemStyle::Personal);
    let title = to_json(&renderer.render(&PageBlock::Title("\u{1f50d} Issues for Amy".into())));
    assert_eq!(title["type"], "header");
    assert_eq!(title["text"]["type"], "plain_text");
    assert_eq!(title["text"]["text"], "\u{1f50d} Issues for Amy");

    let summary = to_json(&renderer.render(&PageBlock::Summary {
        total: 3,
        statuses: vec![("POST".into(), 2), ("ON_QA".into(), 1)],
    }));
    let text = summary["text"]["text"].as_str().expect("text");
    assert!(text.starts_with("Found *3* issue(s) across *2* status(es)"));
}

#[test]
fn report_title_is_header_then_divider() {
    let blocks = to_json(&report_title_blocks("Jan 2, 2006"));
    assert_eq!(blocks[0]["type"], "header");
    assert_eq!(
        blocks[0]["text"]["text"],
        "\u{1f9fe} Daily JIRA Summary \u{2014} Jan 2, 2006"
    );
    assert_eq!(blocks[1]["type"], "divider");
}
