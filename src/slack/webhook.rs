//! Unauthenticated JSON posts: slash command `response_url` replies and
//! legacy incoming webhooks.

use serde::Serialize;
use slack_morphism::prelude::{SlackBlock, SlackMessageResponseType};

use crate::errors::truncate_for_error;
use crate::{AppError, Result};

/// Body accepted by a `response_url` or incoming webhook.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookMessage {
    /// `ephemeral` or `in_channel`; omitted for plain webhooks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<SlackMessageResponseType>,
    /// Fallback or error text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Block Kit content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<SlackBlock>>,
    /// Suppress link previews.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unfurl_links: Option<bool>,
}

impl WebhookMessage {
    /// Private text reply visible only to the caller.
    #[must_use]
    pub fn ephemeral_text(text: impl Into<String>) -> Self {
        Self {
            response_type: Some(SlackMessageResponseType::Ephemeral),
            text: Some(text.into()),
            blocks: None,
            unfurl_links: None,
        }
    }

    /// Private block reply visible only to the caller.
    #[must_use]
    pub fn ephemeral_blocks(blocks: Vec<SlackBlock>) -> Self {
        Self {
            response_type: Some(SlackMessageResponseType::Ephemeral),
            text: None,
            blocks: Some(blocks),
            unfurl_links: None,
        }
    }

    /// Channel message for a legacy incoming webhook.
    #[must_use]
    pub fn blocks(blocks: Vec<SlackBlock>) -> Self {
        Self {
            response_type: None,
            text: None,
            blocks: Some(blocks),
            unfurl_links: Some(false),
        }
    }
}

/// Posts [`WebhookMessage`]s to caller-supplied URLs.
#[derive(Clone, Default)]
pub struct WebhookClient {
    http: reqwest::Client,
}

impl WebhookClient {
    /// Create a client with default transport settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// POST `message` as JSON to `url`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the request fails and
    /// `AppError::Remote` for any status of 300 or above.
    pub async fn post(&self, url: &str, message: &WebhookMessage) -> Result<()> {
        let response = self
            .http
            .post(url)
            .json(message)
            .send()
            .await
            .map_err(|err| AppError::Transport(format!("webhook post failed: {err}")))?;

        let status = response.status();
        if status.as_u16() >= 300 {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote(format!(
                "webhook returned {status}: {}",
                truncate_for_error(&body)
            )));
        }
        Ok(())
    }
}
