use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::MaybeViewer;
use crate::models::{ActivityResponse, FeedId};
use crate::services::{ActivityRequest, ActivityService};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQueryParams {
    pub cursor: Option<String>,
    pub page_size: Option<u32>,
    /// Comma-separated category names.
    pub category_filter: Option<String>,
}

impl ActivityQueryParams {
    pub(crate) fn categories(&self) -> Vec<String> {
        self.category_filter
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn into_request(self, feed: FeedId, viewer: MaybeViewer) -> ActivityRequest {
        let categories = self.categories();
        ActivityRequest {
            feed,
            viewer: viewer.into_firebase_id(),
            cursor: self.cursor.filter(|c| !c.is_empty()),
            page_size: self.page_size,
            categories,
        }
    }
}

/// A path id that is not a UUID cannot name an existing feed.
fn parse_feed_id(raw: &str, kind: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("{} {}", kind, raw)))
}

async fn respond(service: &ActivityService, request: ActivityRequest) -> Result<HttpResponse> {
    debug!(
        "Activity request: feed={} cursor={} page_size={:?} categories={:?}",
        request.feed,
        request.cursor.is_some(),
        request.page_size,
        request.categories
    );

    let page = service.get_activity(request).await?;
    let response = ActivityResponse::try_from(page)
        .map_err(|e| AppError::Internal(format!("cursor encoding failed: {}", e)))?;

    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/v1/boards/{board_id}/activity
pub async fn get_board_activity(
    path: web::Path<String>,
    query: web::Query<ActivityQueryParams>,
    viewer: MaybeViewer,
    service: web::Data<ActivityService>,
) -> Result<HttpResponse> {
    let board_id = parse_feed_id(&path, "board")?;
    let request = query
        .into_inner()
        .into_request(FeedId::Board(board_id), viewer);

    respond(&service, request).await
}

/// GET /api/v1/threads/{thread_id}/activity
pub async fn get_thread_activity(
    path: web::Path<String>,
    query: web::Query<ActivityQueryParams>,
    viewer: MaybeViewer,
    service: web::Data<ActivityService>,
) -> Result<HttpResponse> {
    let thread_id = parse_feed_id(&path, "thread")?;
    let request = query
        .into_inner()
        .into_request(FeedId::Thread(thread_id), viewer);

    respond(&service, request).await
}

/// GET /api/v1/subscriptions/{subscription_id}/activity
pub async fn get_subscription_activity(
    path: web::Path<String>,
    query: web::Query<ActivityQueryParams>,
    viewer: MaybeViewer,
    service: web::Data<ActivityService>,
) -> Result<HttpResponse> {
    let subscription_id = parse_feed_id(&path, "subscription")?;
    let request = query
        .into_inner()
        .into_request(FeedId::Subscription(subscription_id), viewer);

    respond(&service, request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_filter_is_comma_separated() {
        let params = ActivityQueryParams {
            category_filter: Some("odd, even,,  ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.categories(), vec!["odd".to_string(), "even".to_string()]);
        assert!(ActivityQueryParams::default().categories().is_empty());
    }

    #[test]
    fn test_non_uuid_feed_id_is_not_found() {
        assert!(matches!(
            parse_feed_id("gore", "board"),
            Err(AppError::NotFound(_))
        ));
        assert!(parse_feed_id("c6d3d10e-8e49-4d73-b28a-9d652b41beec", "board").is_ok());
    }
}
