use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{ActivityStore, FeedQuery, StoreError};
use crate::models::{ActivityRow, FeedId};
use crate::pagination::TimestampPrecision;

/// Activity store held in process memory.
///
/// Follows the same contract as [`super::PgActivityStore`] apart from the
/// viewer: `is_self` and `is_friend` are stored on the rows as given.
#[derive(Debug, Default)]
pub struct InMemoryActivityStore {
    precision: TimestampPrecision,
    feeds: RwLock<HashMap<FeedId, Vec<ActivityRow>>>,
}

impl InMemoryActivityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_precision(precision: TimestampPrecision) -> Self {
        Self {
            precision,
            feeds: RwLock::default(),
        }
    }

    /// Register an empty feed. Feeds that were never created read as missing.
    pub async fn create_feed(&self, feed: FeedId) {
        self.feeds.write().await.entry(feed).or_default();
    }

    /// Add a row to a feed, creating the feed if needed.
    pub async fn insert(&self, feed: FeedId, row: ActivityRow) {
        self.feeds.write().await.entry(feed).or_default().push(row);
    }
}

#[async_trait]
impl ActivityStore for InMemoryActivityStore {
    fn precision(&self) -> TimestampPrecision {
        self.precision
    }

    async fn fetch_activity(&self, query: &FeedQuery) -> Result<Option<Vec<ActivityRow>>, StoreError> {
        let feeds = self.feeds.read().await;
        let Some(rows) = feeds.get(&query.feed) else {
            return Ok(None);
        };

        let mut page: Vec<ActivityRow> = rows
            .iter()
            .filter(|row| {
                query.categories.is_empty()
                    || row
                        .categories
                        .iter()
                        .any(|c| query.categories.contains(&c.to_lowercase()))
            })
            .filter(|row| match &query.boundary {
                Some(boundary) => boundary.admits(&row.key()),
                None => true,
            })
            .cloned()
            .collect();

        page.sort_by_key(ActivityRow::key);
        page.truncate(query.limit as usize);

        Ok(Some(page))
    }
}
