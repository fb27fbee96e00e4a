//! Cursor-based pagination for activity feeds.
//!
//! - `timestamp`: full-precision activity timestamps, feed order, boundaries
//! - `cursor`: the opaque continuation token
//! - `engine`: page planning and assembly on top of any activity store

pub mod cursor;
pub mod engine;
pub mod timestamp;

pub use cursor::{Cursor, CursorError};
pub use engine::{ActivityPager, PagePlan, PageSizePolicy, Paged, PaginationError};
pub use timestamp::{ActivityKey, Boundary, TimestampError, TimestampPrecision};
