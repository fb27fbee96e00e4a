//! Data models for board activity feeds
//!
//! - `activity`: feed identifiers, store rows, client items and pages
//! - `identity`: secret and real identities shown next to content

pub mod activity;
pub mod identity;

pub use activity::{ActivityItem, ActivityResponse, ActivityRow, CursorResponse, FeedId, Page};
pub use identity::Identity;
