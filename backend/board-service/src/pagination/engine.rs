//! Page planning and page assembly.
//!
//! The pager never talks to a store. [`ActivityPager::plan`] turns the
//! caller's cursor and page size into a [`PagePlan`] (page size, boundary and
//! fetch limit) and [`ActivityPager::finish`] turns the rows fetched for that
//! plan into a page plus the next cursor. Whatever sits between the two must
//! return rows in feed order, inside the boundary, at most
//! [`PagePlan::fetch_limit`] of them; `finish` checks all of it.

use thiserror::Error;

use super::cursor::{Cursor, CursorError};
use super::timestamp::{format_timestamp, ActivityKey, Boundary, TimestampPrecision};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;
/// Hard upper bound on any configured maximum.
pub const PAGE_SIZE_CEILING: u32 = 1_000;

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("invalid cursor: {0}")]
    InvalidCursor(#[from] CursorError),

    #[error("page size {requested} is outside 1..={max}")]
    PageSize { requested: u32, max: u32 },

    #[error("activity store broke the page contract: {0}")]
    StoreContract(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizePolicy {
    pub default: u32,
    pub max: u32,
}

impl Default for PageSizePolicy {
    fn default() -> Self {
        Self {
            default: DEFAULT_PAGE_SIZE,
            max: MAX_PAGE_SIZE,
        }
    }
}

/// What to fetch for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    page_size: u32,
    boundary: Option<Boundary>,
}

impl PagePlan {
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// `None` means the page starts at the most recent activity.
    pub fn boundary(&self) -> Option<Boundary> {
        self.boundary
    }

    /// One row beyond the page, so a full page knows whether more remain.
    pub fn fetch_limit(&self) -> u32 {
        self.page_size.saturating_add(1)
    }
}

/// One assembled page. `next` is `None` iff the feed is exhausted.
#[derive(Debug, Clone, PartialEq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub next: Option<Cursor>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityPager {
    precision: TimestampPrecision,
    page_sizes: PageSizePolicy,
}

impl ActivityPager {
    pub fn new(precision: TimestampPrecision, page_sizes: PageSizePolicy) -> Self {
        Self {
            precision,
            page_sizes,
        }
    }

    /// Resolve the page to fetch.
    ///
    /// A cursor carries its own page size, which wins over `requested`.
    pub fn plan(
        &self,
        cursor: Option<&str>,
        requested: Option<u32>,
    ) -> Result<PagePlan, PaginationError> {
        let max = self.page_sizes.max.min(PAGE_SIZE_CEILING);

        if let Some(encoded) = cursor {
            let cursor = Cursor::decode(encoded)?;
            if cursor.page_size() > max {
                return Err(CursorError::PageTooLarge {
                    page_size: cursor.page_size(),
                    max,
                }
                .into());
            }

            return Ok(PagePlan {
                page_size: cursor.page_size(),
                boundary: Some(Boundary {
                    before: cursor.last_activity_cursor(),
                    after_id: cursor.last_activity_id(),
                }),
            });
        }

        let page_size = requested.unwrap_or(self.page_sizes.default);
        if page_size == 0 || page_size > max {
            return Err(PaginationError::PageSize {
                requested: page_size,
                max,
            });
        }

        Ok(PagePlan {
            page_size,
            boundary: None,
        })
    }

    /// Cut fetched rows down to a page and derive the continuation cursor.
    ///
    /// Rows must be the store's answer to `plan`. Any deviation from the
    /// contract is an error; a page is never silently trimmed or reordered.
    pub fn finish<T, K>(
        &self,
        plan: &PagePlan,
        mut rows: Vec<T>,
        key: K,
    ) -> Result<Paged<T>, PaginationError>
    where
        K: Fn(&T) -> ActivityKey,
    {
        if rows.len() > plan.fetch_limit() as usize {
            return Err(PaginationError::StoreContract(format!(
                "{} rows returned for a limit of {}",
                rows.len(),
                plan.fetch_limit()
            )));
        }

        let keys: Vec<ActivityKey> = rows.iter().map(&key).collect();
        self.check_rows(plan, &keys)?;

        if rows.len() <= plan.page_size() as usize {
            return Ok(Paged {
                items: rows,
                next: None,
            });
        }

        let lookahead = keys[plan.page_size() as usize];
        let last = keys[plan.page_size() as usize - 1];
        rows.truncate(plan.page_size() as usize);

        let cursor = Cursor::new(last.last_activity_at, plan.page_size())
            .map_err(|e| PaginationError::StoreContract(e.to_string()))?;
        let next = if lookahead.last_activity_at == last.last_activity_at {
            cursor.with_tie_break(last.id)
        } else {
            cursor
        };

        Ok(Paged {
            items: rows,
            next: Some(next),
        })
    }

    fn check_rows(&self, plan: &PagePlan, keys: &[ActivityKey]) -> Result<(), PaginationError> {
        for key in keys {
            if !self.precision.admits(key.last_activity_at) {
                return Err(PaginationError::StoreContract(format!(
                    "item {} has timestamp {:?} finer than {} fractional digits",
                    key.id,
                    key.last_activity_at,
                    self.precision.fractional_digits()
                )));
            }

            if let Some(boundary) = plan.boundary() {
                if !boundary.admits(key) {
                    return Err(PaginationError::StoreContract(format!(
                        "item {} at {} is not after the cursor at {}",
                        key.id,
                        format_timestamp(&key.last_activity_at),
                        format_timestamp(&boundary.before)
                    )));
                }
            }
        }

        if let Some(pair) = keys.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(PaginationError::StoreContract(format!(
                "item {} is out of feed order after item {}",
                pair[1].id, pair[0].id
            )));
        }

        Ok(())
    }
}
