//! Slack Block Kit message builders.
//!
//! Provides the mrkdwn escaping and truncation helpers and turns report
//! [`PageBlock`]s into `slack-morphism` blocks. Raw text is escaped here,
//! once, every time a block is rendered.

use slack_morphism::prelude::{
    SlackBlock, SlackBlockPlainTextOnly, SlackBlockText, SlackDividerBlock, SlackHeaderBlock,
    SlackSectionBlock,
};

use crate::report::pages::{Page, PageBlock};
use crate::report::Item;

/// Slack caps header text at 150 characters.
const HEADER_LIMIT: usize = 150;

/// Placeholder shown when an item has no linked pull requests.
const NO_LINKS: &str = "\u{2013}";

/// Escape the characters that have meaning in Slack mrkdwn.
#[must_use]
pub fn escape_mrkdwn(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Cut `text` to `limit` characters, appending `...` when shortened.
#[must_use]
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_owned(),
    }
}

/// Format pull request links as `<url|PR1> <url|PR2>`.
#[must_use]
pub fn pr_links(links: &[String]) -> String {
    if links.is_empty() {
        return NO_LINKS.to_owned();
    }
    links
        .iter()
        .enumerate()
        .map(|(i, url)| format!("<{url}|PR{}>", i + 1))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build a plain text section block.
#[must_use]
pub fn text_section(text: &str) -> SlackBlock {
    SlackBlock::Section(SlackSectionBlock::new().with_text(SlackBlockText::MarkDown(text.into())))
}

/// Build a header block; text longer than Slack allows is shortened.
#[must_use]
pub fn header(text: &str) -> SlackBlock {
    let text = truncate_chars(text, HEADER_LIMIT - 3);
    SlackBlock::Header(SlackHeaderBlock::new(SlackBlockPlainTextOnly::from(
        text.as_str(),
    )))
}

/// Build a divider block.
#[must_use]
pub fn divider() -> SlackBlock {
    SlackBlock::Divider(SlackDividerBlock::new())
}

/// Root message of the daily report thread.
#[must_use]
pub fn report_title_blocks(date: &str) -> Vec<SlackBlock> {
    vec![
        header(&format!("\u{1f9fe} Daily JIRA Summary \u{2014} {date}")),
        divider(),
    ]
}

/// Layout of a single issue line.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ItemStyle {
    /// Compact line used in the channel report.
    Daily,
    /// Bulleted line used in the `/issues` view.
    Personal,
}

/// Renders [`PageBlock`]s for one Jira instance.
#[derive(Debug, Clone)]
pub struct BlockRenderer {
    jira_base: String,
    summary_limit: usize,
    style: ItemStyle,
}

impl BlockRenderer {
    /// Create a renderer linking issues under `jira_base`.
    #[must_use]
    pub fn new(jira_base: &str, summary_limit: usize, style: ItemStyle) -> Self {
        Self {
            jira_base: jira_base.trim_end_matches('/').to_owned(),
            summary_limit,
            style,
        }
    }

    /// Render every block of a page in order.
    #[must_use]
    pub fn render_page(&self, page: &Page) -> Vec<SlackBlock> {
        page.blocks().iter().map(|block| self.render(block)).collect()
    }

    /// Render one block.
    #[must_use]
    pub fn render(&self, block: &PageBlock) -> SlackBlock {
        match block {
            PageBlock::Title(title) => header(title),
            PageBlock::Summary { total, statuses } => text_section(&summary_text(*total, statuses)),
            PageBlock::PersonHeader { name, continued } => {
                let suffix = if *continued { " (continued)" } else { "" };
                text_section(&format!("*\u{1f464} {}*{suffix}", escape_mrkdwn(name)))
            }
            PageBlock::StatusHeader {
                status,
                count,
                continued,
            } => {
                let status = escape_mrkdwn(status);
                if *continued {
                    text_section(&format!("\u{1f4c2} *{status}* (continued)"))
                } else {
                    text_section(&format!("\u{1f4c2} *{status}* ({count})"))
                }
            }
            PageBlock::Item(item) => text_section(&self.item_text(item)),
            PageBlock::Truncated { remaining } => {
                text_section(&format!("_...and {remaining} more issue(s) not shown_"))
            }
            PageBlock::Divider | PageBlock::PageBreak => divider(),
        }
    }

    /// mrkdwn line for one issue.
    #[must_use]
    pub fn item_text(&self, item: &Item) -> String {
        let summary = escape_mrkdwn(&truncate_chars(&item.summary, self.summary_limit));
        let status = escape_mrkdwn(&item.status);
        let link = format!(
            "<{}/browse/{key}|*{key}*>",
            self.jira_base,
            key = item.key
        );
        let prs = pr_links(&item.links);
        match self.style {
            ItemStyle::Daily => {
                format!("{link} \u{2014} {summary}\nStatus: *{status}* | PR: {prs}")
            }
            ItemStyle::Personal => format!(
                "\u{2022} {link} \u{2014} {summary}\n   *Status:* {status}  |  *PR:* {prs}"
            ),
        }
    }
}

fn summary_text(total: usize, statuses: &[(String, usize)]) -> String {
    let lines = statuses
        .iter()
        .map(|(status, count)| format!("\u{2022} *{}:* {count}", escape_mrkdwn(status)))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Found *{total}* issue(s) across *{}* status(es)\n\n\u{1f4ca} *Summary:*\n{lines}",
        statuses.len()
    )
}
