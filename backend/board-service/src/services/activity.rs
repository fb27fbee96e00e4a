use std::sync::Arc;
use tracing::{debug, error};

use crate::db::{ActivityStore, FeedQuery};
use crate::error::{AppError, Result};
use crate::metrics::activity::{
    ACTIVITY_REQUESTS_TOTAL, ACTIVITY_REQUEST_DURATION_SECONDS, ACTIVITY_ROWS_FETCHED,
};
use crate::models::{ActivityItem, ActivityRow, FeedId, Page};
use crate::pagination::{ActivityPager, PageSizePolicy};

/// One activity page request, as received from a handler.
#[derive(Debug, Clone)]
pub struct ActivityRequest {
    pub feed: FeedId,
    /// Firebase uid of the viewer, if the request was identified.
    pub viewer: Option<String>,
    pub cursor: Option<String>,
    pub page_size: Option<u32>,
    pub categories: Vec<String>,
}

impl ActivityRequest {
    pub fn new(feed: FeedId) -> Self {
        Self {
            feed,
            viewer: None,
            cursor: None,
            page_size: None,
            categories: Vec::new(),
        }
    }
}

/// Activity service - pages board, thread and subscription feeds out of an activity store
pub struct ActivityService {
    store: Arc<dyn ActivityStore>,
    pager: ActivityPager,
}

impl ActivityService {
    pub fn new(store: Arc<dyn ActivityStore>, page_sizes: PageSizePolicy) -> Self {
        let pager = ActivityPager::new(store.precision(), page_sizes);
        Self { store, pager }
    }

    /// Fetch one page of a feed.
    ///
    /// No cursor starts at the most recent activity. The returned page carries
    /// the cursor for the following page, or none once the feed is exhausted.
    #[tracing::instrument(skip(self, request), fields(feed = %request.feed))]
    pub async fn get_activity(&self, request: ActivityRequest) -> Result<Page> {
        let feed = request.feed.kind();
        let timer = ACTIVITY_REQUEST_DURATION_SECONDS
            .with_label_values(&[feed])
            .start_timer();

        let result = self.load_page(request).await;
        timer.observe_duration();

        let outcome = match &result {
            Ok(_) => "ok",
            Err(AppError::InvalidCursor(_)) | Err(AppError::Validation(_)) => "rejected",
            Err(AppError::NotFound(_)) => "not_found",
            Err(_) => "error",
        };
        ACTIVITY_REQUESTS_TOTAL
            .with_label_values(&[feed, outcome])
            .inc();

        result
    }

    async fn load_page(&self, request: ActivityRequest) -> Result<Page> {
        let plan = self
            .pager
            .plan(request.cursor.as_deref(), request.page_size)?;

        let query = FeedQuery::new(request.feed, plan.fetch_limit())
            .with_viewer(request.viewer)
            .with_boundary(plan.boundary())
            .with_categories(&request.categories);

        let rows = match self.store.fetch_activity(&query).await {
            Ok(Some(rows)) => rows,
            Ok(None) => return Err(AppError::NotFound(format!("{}", request.feed))),
            Err(e) => {
                error!(feed = %request.feed, "Activity store read failed: {}", e);
                return Err(e.into());
            }
        };
        ACTIVITY_ROWS_FETCHED
            .with_label_values(&[request.feed.kind()])
            .observe(rows.len() as f64);

        let paged = self
            .pager
            .finish(&plan, rows, ActivityRow::key)
            .map_err(|e| {
                error!(feed = %request.feed, "Activity store returned an invalid page: {}", e);
                AppError::from(e)
            })?;

        debug!(
            feed = %request.feed,
            items = paged.items.len(),
            has_more = paged.next.is_some(),
            "activity page assembled"
        );

        Ok(Page {
            activity: paged.items.into_iter().map(ActivityItem::from).collect(),
            cursor: paged.next,
        })
    }
}
