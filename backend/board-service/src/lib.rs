/// Board Service Library
///
/// Serves the activity feeds of boards, threads and subscriptions: newest
/// activity first, paged with opaque cursors that keep full timestamp
/// precision.
///
/// # Modules
///
/// - `pagination`: cursor codec, timestamp ordering and page assembly
/// - `db`: activity store trait with PostgreSQL and in-memory implementations
/// - `models`: feed ids, store rows, client-facing activity items
/// - `services`: activity paging on top of a store
/// - `handlers`: HTTP handlers and route registration
/// - `middleware`: viewer identification and request metrics
/// - `error`: error types and HTTP mapping
/// - `config`: configuration management
/// - `metrics`: Prometheus collectors and the `/metrics` handler
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
