//! Paginating client for the Jira search endpoint.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde_json::json;
use tracing::{debug, info, warn};

use super::models::{FieldMap, Record, SearchResponse};
use crate::config::JiraConfig;
use crate::errors::truncate_for_error;
use crate::{AppError, Result};

/// Jira REST client bound to one instance and bearer token.
#[derive(Clone)]
pub struct JiraClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    page_size: u32,
    fields: FieldMap,
}

impl JiraClient {
    /// Build a client from the Jira section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be constructed.
    pub fn new(config: &JiraConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("jira-slack-digest"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| AppError::Config(format!("failed to create jira client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            token: config.token.trim().to_owned(),
            page_size: config.page_size.max(1),
            fields: FieldMap {
                reviewer: config.reviewer_field.clone(),
                pull_requests: config.pull_request_field.clone(),
            },
        })
    }

    /// Custom field ids used when normalizing records.
    #[must_use]
    pub fn field_map(&self) -> &FieldMap {
        &self.fields
    }

    /// Fetch every issue matching `jql`, one page at a time.
    ///
    /// Pagination stops once the requested offset plus the issues received
    /// reaches the server-reported total, or a page comes back empty.
    /// Any failed page fails the whole search.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if a request cannot be sent,
    /// `AppError::Remote` on a non-success status, and `AppError::Decode`
    /// if a page is not a valid search response.
    pub async fn search(&self, jql: &str) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut offset = 0usize;
        let step = self.page_size as usize;

        loop {
            let page = self.search_page(jql, offset).await?;
            let received = page.issues.len();
            let reached = offset + received;
            let total = page.total;

            records.extend(
                page.issues
                    .into_iter()
                    .map(|raw| Record::from_raw(raw, &self.fields)),
            );

            if reached >= total {
                info!(total, "fetched all jira issues");
                break;
            }
            if received == 0 {
                warn!(
                    fetched = records.len(),
                    total,
                    "jira returned an empty page before the reported total"
                );
                break;
            }

            debug!(fetched = reached, total, "fetched jira page, continuing");
            offset += step;
        }

        Ok(records)
    }

    async fn search_page(&self, jql: &str, start_at: usize) -> Result<SearchResponse> {
        let body = json!({
            "jql": jql,
            "startAt": start_at,
            "maxResults": self.page_size,
            "fields": self.fields.search_fields(),
        });

        let response = self
            .http
            .post(format!("{}/rest/api/2/search", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|err| AppError::Transport(format!("jira search request failed: {err}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| AppError::Transport(format!("failed to read jira response: {err}")))?;

        if !status.is_success() {
            return Err(AppError::Remote(format!(
                "jira search returned {status}: {}",
                truncate_for_error(&text)
            )));
        }

        serde_json::from_str(&text)
            .map_err(|err| AppError::Decode(format!("invalid jira search response: {err}")))
    }
}
