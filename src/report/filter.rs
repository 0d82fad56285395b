//! Inclusion rules and grouping by responsible person and status.

use std::collections::{BTreeMap, HashSet};

use crate::config::ReportConfig;
use crate::jira::Record;

use super::{Item, PersonGroup, StatusGroup, UNASSIGNED};

/// Immutable filtering rules, fixed for the lifetime of a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRules {
    /// Components that exclude an issue (exact, case-sensitive).
    pub excluded_components: HashSet<String>,
    /// Labels that exclude an issue (exact, case-sensitive).
    pub excluded_labels: HashSet<String>,
    /// Umbrella issue type, kept only with at least one link.
    pub umbrella_type: String,
    /// Statuses in which the reviewer owns the issue.
    pub reviewer_statuses: HashSet<String>,
    /// Preferred status order; unknown statuses follow in encounter order.
    pub status_order: Vec<String>,
}

impl Default for FilterRules {
    fn default() -> Self {
        ReportConfig::default().filter_rules()
    }
}

/// Whether the `/issues` view applies the daily report exclusions.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum FilterMode {
    /// Show every issue matching the person.
    #[default]
    IncludeEverything,
    /// Apply component, label, and umbrella rules first.
    DailyReport,
}

/// Applies [`FilterRules`] to fetched records.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    rules: FilterRules,
}

impl ReportFilter {
    /// Create a filter over fixed rules.
    #[must_use]
    pub fn new(rules: FilterRules) -> Self {
        Self { rules }
    }

    /// Rules this filter applies.
    #[must_use]
    pub fn rules(&self) -> &FilterRules {
        &self.rules
    }

    /// True when a component or label is on an exclusion list.
    #[must_use]
    pub fn is_excluded(&self, record: &Record) -> bool {
        record
            .components
            .iter()
            .any(|c| self.rules.excluded_components.contains(c))
            || record
                .labels
                .iter()
                .any(|l| self.rules.excluded_labels.contains(l))
    }

    /// Daily report inclusion: not excluded, and umbrellas need a link.
    #[must_use]
    pub fn is_included(&self, record: &Record, links: &[String]) -> bool {
        if self.is_excluded(record) {
            return false;
        }
        !(record.issue_type == self.rules.umbrella_type && links.is_empty())
    }

    /// Who the issue is reported under.
    #[must_use]
    pub fn responsible_person(&self, record: &Record) -> String {
        let reviewer = record
            .reviewer
            .as_deref()
            .filter(|name| !name.is_empty())
            .filter(|_| self.rules.reviewer_statuses.contains(&record.status));

        reviewer
            .or(record.assignee.as_deref())
            .unwrap_or(UNASSIGNED)
            .to_owned()
    }

    /// Group included records by person, then by status.
    ///
    /// People are sorted ascending; statuses follow the preferred order.
    #[must_use]
    pub fn group_by_person(&self, records: &[Record]) -> Vec<PersonGroup> {
        let mut people: BTreeMap<String, Vec<StatusGroup>> = BTreeMap::new();

        for record in records {
            let links = record.link_urls();
            if !self.is_included(record, &links) {
                continue;
            }
            let person = self.responsible_person(record);
            push_item(people.entry(person).or_default(), Item::new(record, links));
        }

        people
            .into_iter()
            .map(|(person, statuses)| PersonGroup {
                person,
                statuses: self.order_statuses(statuses),
            })
            .collect()
    }

    /// Records whose assignee or reviewer name contains `query`,
    /// ignoring case, grouped by status.
    ///
    /// Substring matching can select several people for a short query.
    #[must_use]
    pub fn filter_for_user(
        &self,
        records: &[Record],
        query: &str,
        mode: FilterMode,
    ) -> Vec<StatusGroup> {
        let needle = query.to_lowercase();
        let mut statuses = Vec::new();

        for record in records {
            let links = record.link_urls();
            if mode == FilterMode::DailyReport && !self.is_included(record, &links) {
                continue;
            }
            let matches = [&record.assignee, &record.reviewer]
                .into_iter()
                .flatten()
                .any(|name| name.to_lowercase().contains(&needle));
            if matches {
                push_item(&mut statuses, Item::new(record, links));
            }
        }

        self.order_statuses(statuses)
    }

    /// Preferred statuses first, then the rest in encounter order.
    fn order_statuses(&self, mut groups: Vec<StatusGroup>) -> Vec<StatusGroup> {
        let mut ordered = Vec::with_capacity(groups.len());
        for status in &self.rules.status_order {
            if let Some(pos) = groups.iter().position(|g| &g.status == status) {
                ordered.push(groups.remove(pos));
            }
        }
        ordered.extend(groups);
        ordered
    }
}

fn push_item(groups: &mut Vec<StatusGroup>, item: Item) {
    match groups.iter_mut().find(|g| g.status == item.status) {
        Some(group) => group.items.push(item),
        None => groups.push(StatusGroup {
            status: item.status.clone(),
            items: vec![item],
        }),
    }
}
