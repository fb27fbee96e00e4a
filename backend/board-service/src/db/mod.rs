//! Activity store access
//!
//! - [`ActivityStore`]: the read seam the activity service pages through
//! - `activity_repo`: PostgreSQL implementation
//! - `memory`: in-process implementation for tests and local runs

pub mod activity_repo;
pub mod memory;

pub use activity_repo::PgActivityStore;
pub use memory::InMemoryActivityStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ActivityRow, FeedId};
use crate::pagination::{Boundary, TimestampPrecision};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Contract(String),
}

/// One bounded read of a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub feed: FeedId,
    /// Firebase uid of the viewer, if any. Drives `is_self` and `is_friend`.
    pub viewer: Option<String>,
    /// Only rows strictly after this position in feed order.
    pub boundary: Option<Boundary>,
    /// Lowercased category names; a row matches when it carries any of them.
    pub categories: Vec<String>,
    pub limit: u32,
}

impl FeedQuery {
    pub fn new(feed: FeedId, limit: u32) -> Self {
        Self {
            feed,
            viewer: None,
            boundary: None,
            categories: Vec::new(),
            limit,
        }
    }

    pub fn with_viewer(mut self, viewer: Option<String>) -> Self {
        self.viewer = viewer;
        self
    }

    pub fn with_boundary(mut self, boundary: Option<Boundary>) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.categories = categories
            .into_iter()
            .map(|c| c.as_ref().trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        self.categories.sort();
        self.categories.dedup();
        self
    }
}

/// Read side of activity storage.
///
/// `fetch_activity` returns `Ok(None)` when the feed does not exist. Rows come
/// back in feed order (last activity descending, item id ascending), admitted
/// by `query.boundary`, at most `query.limit` of them, with timestamps no
/// finer than [`ActivityStore::precision`].
#[async_trait]
pub trait ActivityStore: Send + Sync {
    fn precision(&self) -> TimestampPrecision {
        TimestampPrecision::Microseconds
    }

    async fn fetch_activity(&self, query: &FeedQuery) -> Result<Option<Vec<ActivityRow>>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_categories_are_normalized() {
        let query = FeedQuery::new(FeedId::Board(Uuid::nil()), 11)
            .with_categories(["Odd", " odd", "", "EVEN"]);
        assert_eq!(query.categories, vec!["even".to_string(), "odd".to_string()]);
    }
}
