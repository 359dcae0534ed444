//! Offset-based pagination
//!
//! Drains one logical query that may return more results than a single page
//! holds. Pages are requested at offsets 0, page_size, 2*page_size, ... until
//! a short page signals exhaustion. A page that does not come back as
//! `Success` ends the drain with whatever was accumulated so far, so a
//! persistently failing query can never loop forever.
//!
//! Includes safety mechanisms:
//! - Maximum page limit
//! - Failure outcome recorded instead of silently skipped

use std::future::Future;
use tracing::{debug, warn};

use super::FetchOutcome;
use crate::scheduler::config::DEFAULT_PAGE_SIZE;

/// Maximum pages drained for one query
pub const MAX_PAGES: usize = 10_000;

/// Position of the next page to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// Offset of the first result on the page
    pub offset: usize,
    /// Results requested per page
    pub page_size: usize,
}

impl PageCursor {
    /// Cursor at offset 0
    pub fn start(page_size: usize) -> Self {
        Self {
            offset: 0,
            page_size: page_size.max(1),
        }
    }

    /// A page holding fewer than `page_size` results is the last one
    pub fn is_terminal(&self, returned: usize) -> bool {
        returned < self.page_size
    }

    /// Move to the following page
    pub fn advance(&mut self) {
        self.offset += self.page_size;
    }
}

/// Why a drain stopped
#[derive(Debug, Clone, PartialEq)]
pub enum DrainStop {
    /// A short page was returned
    Exhausted,
    /// A page fetch did not succeed
    Failed(FetchOutcome<()>),
    /// [`MAX_PAGES`] reached
    PageLimit,
}

/// All results of one drained query
#[derive(Debug, Clone, PartialEq)]
pub struct Drained<T> {
    /// Accumulated results from every successful page, in page order
    pub items: Vec<T>,
    /// Page fetches issued
    pub pages: usize,
    /// Why the loop ended
    pub stop: DrainStop,
}

impl<T> Drained<T> {
    /// Whether every page was fetched
    pub fn is_complete(&self) -> bool {
        self.stop == DrainStop::Exhausted
    }
}

/// Offset pagination driver
#[derive(Debug, Clone, Copy)]
pub struct PageDrain {
    page_size: usize,
    max_pages: usize,
}

impl Default for PageDrain {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PageDrain {
    /// Create a driver with the given page cap
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            max_pages: MAX_PAGES,
        }
    }

    /// Override the page limit
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Page cap
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Fetch successive pages until exhaustion, failure or the page limit.
    ///
    /// # Arguments
    /// * `label` - Query label for logs
    /// * `fetch_page` - Fetches the page at the given cursor
    pub async fn drain<T, F, Fut>(&self, label: &str, mut fetch_page: F) -> Drained<T>
    where
        F: FnMut(PageCursor) -> Fut,
        Fut: Future<Output = FetchOutcome<Vec<T>>>,
    {
        let mut items = Vec::new();
        let mut cursor = PageCursor::start(self.page_size);
        let mut pages = 0;

        loop {
            if pages >= self.max_pages {
                warn!(
                    "Max pages ({}) reached for {} at offset {} - stopping",
                    self.max_pages, label, cursor.offset
                );
                return Drained {
                    items,
                    pages,
                    stop: DrainStop::PageLimit,
                };
            }

            debug!(
                "Fetching page {} for {} at offset {}",
                pages + 1,
                label,
                cursor.offset
            );
            let outcome = fetch_page(cursor).await;
            pages += 1;

            let page = match outcome {
                FetchOutcome::Success(page) => page,
                failed => {
                    warn!(
                        "Page {} for {} failed ({}); keeping {} results",
                        pages,
                        label,
                        failed.describe(),
                        items.len()
                    );
                    return Drained {
                        items,
                        pages,
                        stop: DrainStop::Failed(failed.discard()),
                    };
                }
            };

            let returned = page.len();
            items.extend(page);
            debug!("Received {} results in page {} for {}", returned, pages, label);

            if cursor.is_terminal(returned) {
                debug!(
                    "Pagination complete for {} after {} pages. Total results: {}",
                    label,
                    pages,
                    items.len()
                );
                return Drained {
                    items,
                    pages,
                    stop: DrainStop::Exhausted,
                };
            }

            cursor.advance();
        }
    }
}
