/// HTTP handlers for board-service
///
/// - Activity: paged board, thread and subscription activity feeds
/// - Health: liveness and PostgreSQL readiness probes
pub mod activity;
pub mod health;

use actix_web::web;

use crate::error::AppError;

pub use activity::{
    get_board_activity, get_subscription_activity, get_thread_activity, ActivityQueryParams,
};
pub use health::{health_summary, liveness_check, readiness_check};

/// Register the activity routes under `/api/v1`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| AppError::Validation(err.to_string()).into()),
    )
    .service(
        web::scope("/api/v1")
            .route(
                "/boards/{board_id}/activity",
                web::get().to(get_board_activity),
            )
            .route(
                "/threads/{thread_id}/activity",
                web::get().to(get_thread_activity),
            )
            .route(
                "/subscriptions/{subscription_id}/activity",
                web::get().to(get_subscription_activity),
            ),
    );
}
