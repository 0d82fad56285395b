//! Jira search wire types and the normalized [`Record`] view.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// One page of results from `POST /rest/api/2/search`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Total number of matches reported by the server.
    pub total: usize,
    /// Offset of the first issue in this page.
    pub start_at: usize,
    /// Page size the server applied.
    #[serde(default)]
    pub max_results: usize,
    /// Issues in this page.
    #[serde(default)]
    pub issues: Vec<RawIssue>,
}

/// Issue as returned by the search API, before normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawIssue {
    /// Issue key, e.g. `MTV-123`.
    pub key: String,
    /// Requested fields.
    #[serde(default)]
    pub fields: RawFields,
}

/// Standard fields plus any custom fields captured by name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFields {
    summary: Option<String>,
    status: Option<NamedField>,
    assignee: Option<JiraUser>,
    issuetype: Option<NamedField>,
    components: Option<Vec<NamedField>>,
    labels: Option<Vec<String>>,
    #[serde(flatten)]
    custom: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct NamedField {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraUser {
    #[serde(default)]
    display_name: String,
}

/// Custom field ids that differ between Jira instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    /// Field holding the secondary reviewer user object.
    pub reviewer: String,
    /// Field holding linked pull request URLs.
    pub pull_requests: String,
}

impl FieldMap {
    /// Field list sent with every search request.
    #[must_use]
    pub fn search_fields(&self) -> Vec<String> {
        [
            "summary",
            "status",
            "assignee",
            self.reviewer.as_str(),
            "issuetype",
            "components",
            "labels",
            self.pull_requests.as_str(),
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
}

/// The pull request field, which Jira returns as null, a string, or a list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LinkField {
    /// Field missing or null.
    #[default]
    Absent,
    /// Single URL.
    Scalar(String),
    /// List of values; only non-empty strings are links.
    List(Vec<Value>),
    /// Any other JSON shape.
    Unsupported(Value),
}

impl LinkField {
    /// Build from an optional raw JSON value.
    #[must_use]
    pub fn from_value(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Absent,
            Some(value) => serde_json::from_value(value).unwrap_or_default(),
        }
    }

    /// Non-empty link URLs in their original order.
    #[must_use]
    pub fn into_links(self) -> Vec<String> {
        match self {
            Self::Absent | Self::Unsupported(_) => Vec::new(),
            Self::Scalar(url) if url.is_empty() => Vec::new(),
            Self::Scalar(url) => vec![url],
            Self::List(values) => values
                .into_iter()
                .filter_map(|value| match value {
                    Value::String(url) if !url.is_empty() => Some(url),
                    _ => None,
                })
                .collect(),
        }
    }
}

/// A Jira issue reduced to the fields the report cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Issue key.
    pub key: String,
    /// Free-text summary.
    pub summary: String,
    /// Literal status name.
    pub status: String,
    /// Issue type name (e.g. `Epic`).
    pub issue_type: String,
    /// Component names.
    pub components: Vec<String>,
    /// Labels.
    pub labels: Vec<String>,
    /// Assignee display name.
    pub assignee: Option<String>,
    /// Secondary reviewer display name.
    pub reviewer: Option<String>,
    /// Linked pull requests.
    pub links: LinkField,
}

impl Record {
    /// Normalize a raw search hit using the instance's custom field ids.
    #[must_use]
    pub fn from_raw(raw: RawIssue, fields: &FieldMap) -> Self {
        let RawIssue { key, fields: mut raw } = raw;

        let reviewer = raw
            .custom
            .remove(&fields.reviewer)
            .and_then(|value| serde_json::from_value::<JiraUser>(value).ok())
            .map(|user| user.display_name);
        let links = LinkField::from_value(raw.custom.remove(&fields.pull_requests));

        Self {
            key,
            summary: raw.summary.unwrap_or_default(),
            status: raw.status.map(|s| s.name).unwrap_or_default(),
            issue_type: raw.issuetype.map(|t| t.name).unwrap_or_default(),
            components: raw
                .components
                .unwrap_or_default()
                .into_iter()
                .map(|c| c.name)
                .collect(),
            labels: raw.labels.unwrap_or_default(),
            assignee: raw.assignee.map(|user| user.display_name),
            reviewer,
            links,
        }
    }

    /// Normalized pull request links.
    #[must_use]
    pub fn link_urls(&self) -> Vec<String> {
        self.links.clone().into_links()
    }
}
