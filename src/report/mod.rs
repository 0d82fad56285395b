//! Report pipeline: filtering, grouping, pagination, and the two delivery
//! flows built on top of them.

pub mod daily;
pub mod filter;
pub mod pages;
pub mod personal;

use crate::jira::Record;

/// Grouping key used when an issue has neither reviewer nor assignee.
pub const UNASSIGNED: &str = "Unassigned";

/// The simplified view of a record that gets rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Issue key, copied verbatim from the record.
    pub key: String,
    /// Raw summary text; escaped only when rendered.
    pub summary: String,
    /// Literal status name.
    pub status: String,
    /// Linked pull request URLs.
    pub links: Vec<String>,
}

impl Item {
    /// Derive an item from a record and its already-normalized links.
    #[must_use]
    pub fn new(record: &Record, links: Vec<String>) -> Self {
        Self {
            key: record.key.clone(),
            summary: record.summary.clone(),
            status: record.status.clone(),
            links,
        }
    }
}

/// Items sharing one status, in fetch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusGroup {
    /// Literal status name.
    pub status: String,
    /// Items in this status.
    pub items: Vec<Item>,
}

/// All statuses owned by one responsible person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonGroup {
    /// Display name, or [`UNASSIGNED`].
    pub person: String,
    /// Status groups in display order.
    pub statuses: Vec<StatusGroup>,
}

impl PersonGroup {
    /// Items under `status`, if the person has any.
    #[must_use]
    pub fn items_in(&self, status: &str) -> Option<&[Item]> {
        self.statuses
            .iter()
            .find(|group| group.status == status)
            .map(|group| group.items.as_slice())
    }

    /// Number of items across all statuses.
    #[must_use]
    pub fn item_count(&self) -> usize {
        count_items(&self.statuses)
    }
}

/// Number of items across a list of status groups.
#[must_use]
pub fn count_items(groups: &[StatusGroup]) -> usize {
    groups.iter().map(|group| group.items.len()).sum()
}
