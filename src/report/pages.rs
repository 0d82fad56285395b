//! Greedy packing of grouped items into block-bounded pages.
//!
//! Pages hold abstract [`PageBlock`]s; `slack::blocks` turns them into
//! Block Kit JSON. The builder streams forward and never back-fills an
//! earlier page, so a page may close under capacity.

use super::{count_items, Item, PersonGroup, StatusGroup};

/// Smallest usable page: two headers, one item, and a divider.
pub const MIN_BLOCKS: usize = 4;

/// Most blocks Slack accepts in one message.
pub const SLACK_BLOCK_LIMIT: usize = 50;

/// Default page size, two under [`SLACK_BLOCK_LIMIT`].
pub const DEFAULT_MAX_BLOCKS: usize = 48;

/// One display block before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageBlock {
    /// Plain-text message title.
    Title(String),
    /// Totals per status.
    Summary {
        /// Number of items across all statuses.
        total: usize,
        /// `(status, count)` in display order.
        statuses: Vec<(String, usize)>,
    },
    /// Responsible person heading.
    PersonHeader {
        /// Display name.
        name: String,
        /// Re-emitted at the top of a follow-on page.
        continued: bool,
    },
    /// Status heading within a person or a personal view.
    StatusHeader {
        /// Literal status name.
        status: String,
        /// Items in the status.
        count: usize,
        /// Re-emitted at the top of a follow-on page.
        continued: bool,
    },
    /// One issue.
    Item(Item),
    /// Marker for items dropped from a single-message view.
    Truncated {
        /// Items not shown.
        remaining: usize,
    },
    /// Divider ending a person group.
    Divider,
    /// Divider closing a page that splits a person group.
    PageBreak,
}

impl PageBlock {
    /// True for blocks that exist only because of pagination.
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        matches!(
            self,
            Self::PersonHeader {
                continued: true,
                ..
            } | Self::StatusHeader {
                continued: true,
                ..
            } | Self::Truncated { .. }
                | Self::PageBreak
        )
    }
}

/// One message worth of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    blocks: Vec<PageBlock>,
}

impl Page {
    /// Wrap an already-bounded block list.
    #[must_use]
    pub fn new(blocks: Vec<PageBlock>) -> Self {
        Self { blocks }
    }

    /// Blocks in display order.
    #[must_use]
    pub fn blocks(&self) -> &[PageBlock] {
        &self.blocks
    }

    /// Number of blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True when the page has no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of item blocks.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, PageBlock::Item(_)))
            .count()
    }
}

/// Streams person groups into pages of at most `max_blocks` blocks.
#[derive(Debug)]
pub struct PageBuilder {
    max_blocks: usize,
    pages: Vec<Page>,
    current: Vec<PageBlock>,
}

impl PageBuilder {
    /// Create a builder; `max_blocks` is raised to [`MIN_BLOCKS`] if lower.
    #[must_use]
    pub fn new(max_blocks: usize) -> Self {
        Self {
            max_blocks: max_blocks.max(MIN_BLOCKS),
            pages: Vec::new(),
            current: Vec::new(),
        }
    }

    /// Pack `groups` into pages.
    ///
    /// Each person emits a header, a status header per status when it has
    /// more than one, one block per item, and a closing divider.
    #[must_use]
    pub fn build(mut self, groups: &[PersonGroup]) -> Vec<Page> {
        for group in groups {
            let show_status = group.statuses.len() > 1;
            let opening = if show_status { 4 } else { 3 };
            if !self.fits(opening) {
                self.flush();
            }
            self.current.push(PageBlock::PersonHeader {
                name: group.person.clone(),
                continued: false,
            });

            for status in &group.statuses {
                if show_status {
                    if !self.fits(3) {
                        self.split(&group.person, None);
                    }
                    self.current.push(PageBlock::StatusHeader {
                        status: status.status.clone(),
                        count: status.items.len(),
                        continued: false,
                    });
                }

                for item in &status.items {
                    if !self.fits(2) {
                        let resumed = show_status.then_some(status);
                        self.split(&group.person, resumed);
                    }
                    self.current.push(PageBlock::Item(item.clone()));
                }
            }

            self.current.push(PageBlock::Divider);
        }

        self.flush();
        self.pages
    }

    fn fits(&self, blocks: usize) -> bool {
        self.current.len() + blocks <= self.max_blocks
    }

    fn split(&mut self, person: &str, status: Option<&StatusGroup>) {
        self.current.push(PageBlock::PageBreak);
        self.flush();
        self.current.push(PageBlock::PersonHeader {
            name: person.to_owned(),
            continued: true,
        });
        if let Some(status) = status {
            self.current.push(PageBlock::StatusHeader {
                status: status.status.clone(),
                count: status.items.len(),
                continued: true,
            });
        }
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.pages.push(Page::new(std::mem::take(&mut self.current)));
        }
    }
}

/// Lay out a personal view as a single message of at most `max_blocks`.
///
/// `lead` (title, summary, divider) comes first, then each status header
/// and its items. Overflow is cut and replaced by a [`PageBlock::Truncated`]
/// marker counting the items that were dropped.
#[must_use]
pub fn single_message(lead: Vec<PageBlock>, groups: &[StatusGroup], max_blocks: usize) -> Page {
    let max_blocks = max_blocks.max(MIN_BLOCKS);
    let mut blocks = lead;
    blocks.reserve(groups.len() + count_items(groups));
    for group in groups {
        blocks.push(PageBlock::StatusHeader {
            status: group.status.clone(),
            count: group.items.len(),
            continued: false,
        });
        blocks.extend(group.items.iter().cloned().map(PageBlock::Item));
    }

    if blocks.len() <= max_blocks {
        return Page::new(blocks);
    }

    let dropped = blocks.split_off(max_blocks - 1);
    let remaining = dropped
        .iter()
        .filter(|b| matches!(b, PageBlock::Item(_)))
        .count();
    while let Some(PageBlock::StatusHeader { .. }) = blocks.last() {
        blocks.pop();
    }
    blocks.push(PageBlock::Truncated { remaining });
    Page::new(blocks)
}
