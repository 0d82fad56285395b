//! Slack Web API client for posting report messages and resolving users.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Value};
use slack_morphism::prelude::SlackBlock;
use tracing::debug;

use crate::config::SlackConfig;
use crate::errors::truncate_for_error;
use crate::{AppError, Result};

#[derive(Debug, Deserialize)]
struct ChatPostMessageResponse {
    ok: bool,
    error: Option<String>,
    ts: Option<String>,
    channel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsersInfoResponse {
    ok: bool,
    error: Option<String>,
    user: Option<SlackUser>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackUser {
    #[serde(default)]
    name: String,
    #[serde(default)]
    real_name: String,
    #[serde(default)]
    profile: SlackProfile,
}

#[derive(Debug, Default, Deserialize)]
struct SlackProfile {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    real_name: String,
}

impl SlackUser {
    /// First non-empty of display name, real name, profile real name, handle.
    fn preferred_name(self) -> Option<String> {
        [
            self.profile.display_name,
            self.real_name,
            self.profile.real_name,
            self.name,
        ]
        .into_iter()
        .find(|name| !name.trim().is_empty())
    }
}

/// Identifier of a message created by `chat.postMessage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    /// Channel the message landed in.
    pub channel: String,
    /// Message timestamp; doubles as the thread id for replies.
    pub ts: String,
}

/// Bot-token client for the Slack Web API.
#[derive(Clone)]
pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl SlackApiClient {
    /// Build a client from the Slack section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be constructed.
    pub fn new(config: &SlackConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("jira-slack-digest"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| AppError::Config(format!("failed to create slack client: {err}")))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            bot_token: config.bot_token.trim().to_owned(),
        })
    }

    /// Post a block message, optionally as a reply in `thread_ts`.
    ///
    /// Link and media unfurling are disabled.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the request fails, `AppError::Remote`
    /// if Slack answers `ok: false` or a non-success status, and
    /// `AppError::Decode` if the response is malformed.
    pub async fn post_message(
        &self,
        channel: &str,
        blocks: &[SlackBlock],
        thread_ts: Option<&str>,
    ) -> Result<PostedMessage> {
        let mut payload = json!({
            "channel": channel,
            "blocks": blocks,
            "unfurl_links": false,
            "unfurl_media": false,
        });
        if let Some(thread_ts) = thread_ts {
            payload["thread_ts"] = Value::String(thread_ts.to_owned());
        }

        let response = self
            .http
            .post(format!("{}/chat.postMessage", self.api_base))
            .bearer_auth(&self.bot_token)
            .json(&payload)
            .send()
            .await
            .map_err(|err| AppError::Transport(format!("slack chat.postMessage failed: {err}")))?;
        let response: ChatPostMessageResponse = decode("chat.postMessage", response).await?;

        if !response.ok {
            return Err(AppError::Remote(format!(
                "slack chat.postMessage failed: {}",
                response.error.unwrap_or_else(|| "unknown error".into())
            )));
        }

        let ts = response
            .ts
            .ok_or_else(|| AppError::Decode("slack chat.postMessage response missing ts".into()))?;
        debug!(channel, %ts, blocks = blocks.len(), "posted slack message");

        Ok(PostedMessage {
            channel: response.channel.unwrap_or_else(|| channel.to_owned()),
            ts,
        })
    }

    /// Resolve the name a user is known by in Slack.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Remote` if the lookup is rejected or the user has
    /// no usable name, plus the transport and decode errors of any call.
    pub async fn user_display_name(&self, user_id: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &format!("{}/users.info", self.api_base),
            &[("user", user_id)],
        )
        .map_err(|err| AppError::Config(format!("invalid slack api base: {err}")))?;

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.bot_token)
            .send()
            .await
            .map_err(|err| AppError::Transport(format!("slack users.info failed: {err}")))?;
        let response: UsersInfoResponse = decode("users.info", response).await?;

        if !response.ok {
            return Err(AppError::Remote(format!(
                "slack users.info failed: {}",
                response.error.unwrap_or_else(|| "unknown error".into())
            )));
        }

        response
            .user
            .and_then(SlackUser::preferred_name)
            .ok_or_else(|| AppError::Remote(format!("slack user {user_id} has no name")))
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    method: &str,
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|err| AppError::Transport(format!("failed to read slack {method} response: {err}")))?;
    if !status.is_success() {
        return Err(AppError::Remote(format!(
            "slack {method} returned {status}: {}",
            truncate_for_error(&text)
        )));
    }
    serde_json::from_str(&text)
        .map_err(|err| AppError::Decode(format!("invalid slack {method} response: {err}")))
}
