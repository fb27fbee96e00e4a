/// Business logic layer for board-service
///
/// - Activity service: paged board and thread activity feeds
pub mod activity;

pub use activity::{ActivityRequest, ActivityService};
