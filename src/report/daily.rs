//! Daily channel report: fetch, group by person, paginate, and post as a
//! thread of replies.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use slack_morphism::prelude::SlackBlock;
use tracing::{info, info_span, Instrument};

use super::filter::ReportFilter;
use super::pages::{Page, PageBuilder};
use crate::config::GlobalConfig;
use crate::jira::{jql, JiraClient};
use crate::slack::blocks::{self, BlockRenderer, ItemStyle};
use crate::slack::client::SlackApiClient;
use crate::slack::webhook::{WebhookClient, WebhookMessage};
use crate::{AppError, Result};

/// Text posted in the thread when nothing passes the filters.
pub const EMPTY_REPORT_TEXT: &str = "\u{2705} No issues to report today.";

/// Destination of report messages.
pub trait ReportSink: Send + Sync {
    /// Post one message; replies go to `thread_ts` when the sink threads.
    ///
    /// Returns the id later replies should thread under, if any.
    ///
    /// # Errors
    ///
    /// Returns the transport, remote, or decode error of the post.
    fn post<'a>(
        &'a self,
        blocks: &'a [SlackBlock],
        thread_ts: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + 'a>>;
}

/// Posts through `chat.postMessage` into one channel.
pub struct ChannelSink {
    client: SlackApiClient,
    channel: String,
}

impl ChannelSink {
    /// Bind a Web API client to a channel.
    #[must_use]
    pub fn new(client: SlackApiClient, channel: impl Into<String>) -> Self {
        Self {
            client,
            channel: channel.into(),
        }
    }
}

impl ReportSink for ChannelSink {
    fn post<'a>(
        &'a self,
        blocks: &'a [SlackBlock],
        thread_ts: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + 'a>> {
        Box::pin(async move {
            let posted = self
                .client
                .post_message(&self.channel, blocks, thread_ts)
                .await?;
            Ok(Some(posted.ts))
        })
    }
}

/// Posts every message top-level through a legacy incoming webhook.
pub struct WebhookSink {
    client: WebhookClient,
    url: String,
}

impl WebhookSink {
    /// Bind a webhook client to a URL.
    #[must_use]
    pub fn new(client: WebhookClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl ReportSink for WebhookSink {
    fn post<'a>(
        &'a self,
        blocks: &'a [SlackBlock],
        _thread_ts: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + 'a>> {
        Box::pin(async move {
            self.client
                .post(&self.url, &WebhookMessage::blocks(blocks.to_vec()))
                .await?;
            Ok(None)
        })
    }
}

/// Pick the sink the configuration allows, preferring the bot token.
///
/// # Errors
///
/// Returns `AppError::Config` if neither a bot token with channel nor a
/// webhook URL is configured.
pub fn sink_from_config(config: &GlobalConfig) -> Result<Box<dyn ReportSink>> {
    if !config.slack.bot_token.is_empty() && !config.slack.channel_id.is_empty() {
        let client = SlackApiClient::new(&config.slack)?;
        return Ok(Box::new(ChannelSink::new(client, config.slack.channel_id.clone())));
    }
    match &config.slack.webhook_url {
        Some(url) => Ok(Box::new(WebhookSink::new(WebhookClient::new(), url.clone()))),
        None => Err(AppError::Config(
            "no slack destination: set SLACK_BOT_TOKEN and SLACK_CHANNEL, or SLACK_WEBHOOK_URL"
                .into(),
        )),
    }
}

/// Post `title` as the thread root, then each page as a reply in order.
///
/// Waits `delay` between replies. The first failure stops delivery;
/// messages already posted stay posted.
///
/// # Errors
///
/// Returns the first post error, annotated with the failing reply number.
pub async fn deliver_report(
    sink: &dyn ReportSink,
    title: &[SlackBlock],
    pages: &[Vec<SlackBlock>],
    delay: Duration,
) -> Result<usize> {
    let thread_ts = sink.post(title, None).await?;
    info!(threaded = thread_ts.is_some(), "report thread created");

    for (index, page) in pages.iter().enumerate() {
        sink.post(page, thread_ts.as_deref())
            .await
            .map_err(|err| annotate(err, index + 1, pages.len()))?;
        info!(reply = index + 1, of = pages.len(), blocks = page.len(), "reply sent");

        if index + 1 < pages.len() && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    Ok(pages.len())
}

fn annotate(err: AppError, reply: usize, total: usize) -> AppError {
    let context = format!("reply {reply}/{total}");
    match err {
        AppError::Transport(msg) => AppError::Transport(format!("{context}: {msg}")),
        AppError::Remote(msg) => AppError::Remote(format!("{context}: {msg}")),
        AppError::Decode(msg) => AppError::Decode(format!("{context}: {msg}")),
        other => other,
    }
}

/// Outcome of a delivered daily report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySummary {
    /// Records returned by Jira.
    pub fetched: usize,
    /// Items that passed the filters.
    pub reported: usize,
    /// Thread replies posted.
    pub replies: usize,
}

/// The daily report pipeline bound to one configuration.
pub struct DailyReport {
    jira: JiraClient,
    filter: ReportFilter,
    renderer: BlockRenderer,
    jql: String,
    max_blocks: usize,
    reply_delay: Duration,
}

impl DailyReport {
    /// Build the pipeline from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the Jira client cannot be built.
    pub fn new(config: &GlobalConfig) -> Result<Self> {
        Ok(Self {
            jira: JiraClient::new(&config.jira)?,
            filter: ReportFilter::new(config.report.filter_rules()),
            renderer: BlockRenderer::new(
                &config.jira.base_url,
                config.report.daily_summary_limit,
                ItemStyle::Daily,
            ),
            jql: jql::daily_report(&config.jira, &config.report),
            max_blocks: config.report.max_blocks,
            reply_delay: Duration::from_millis(config.report.reply_delay_ms),
        })
    }

    /// Fetch and lay out the report without sending it.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; nothing is retried.
    pub async fn collect(&self) -> Result<(usize, Vec<Page>)> {
        let records = self.jira.search(&self.jql).await?;
        let groups = self.filter.group_by_person(&records);
        info!(
            fetched = records.len(),
            people = groups.len(),
            "grouped jira issues by person"
        );
        Ok((records.len(), PageBuilder::new(self.max_blocks).build(&groups)))
    }

    /// Fetch, lay out, and deliver the report dated `date`.
    ///
    /// # Errors
    ///
    /// Returns the first fetch or delivery error.
    pub async fn run(&self, sink: &dyn ReportSink, date: &str) -> Result<DailySummary> {
        let span = info_span!("daily_report", %date);
        async move {
            let (fetched, pages) = self.collect().await?;
            let reported = pages.iter().map(Page::item_count).sum();

            let rendered: Vec<Vec<SlackBlock>> = if pages.is_empty() {
                info!("no issues passed the filters");
                vec![vec![blocks::text_section(EMPTY_REPORT_TEXT)]]
            } else {
                pages.iter().map(|page| self.renderer.render_page(page)).collect()
            };

            let title = blocks::report_title_blocks(date);
            let replies = deliver_report(sink, &title, &rendered, self.reply_delay).await?;

            Ok(DailySummary {
                fetched,
                reported,
                replies,
            })
        }
        .instrument(span)
        .await
    }
}
