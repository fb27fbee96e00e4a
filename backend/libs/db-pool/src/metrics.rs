//! Pool gauges and connection acquisition latency.

use prometheus::{register_histogram_vec, register_int_gauge_vec, HistogramVec, IntGaugeVec};
use sqlx::{pool::PoolConnection, PgPool, Postgres};
use std::time::Instant;

lazy_static::lazy_static! {
    /// Connections per service by state (idle, in_use, max).
    static ref DB_POOL_CONNECTIONS: IntGaugeVec = register_int_gauge_vec!(
        "db_pool_connections",
        "Database pool connections by state",
        &["service", "state"]
    ).expect("db_pool_connections registration");

    /// Time spent waiting for a pooled connection, by outcome.
    static ref DB_POOL_ACQUIRE_SECONDS: HistogramVec = register_histogram_vec!(
        "db_pool_acquire_seconds",
        "Time to acquire a pooled connection segmented by outcome",
        &["service", "outcome"],
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]
    ).expect("db_pool_acquire_seconds registration");
}

pub(crate) fn update_pool_metrics(pool: &PgPool, service: &str) {
    let size = i64::from(pool.size());
    let idle = pool.num_idle() as i64;
    let max = i64::from(pool.options().get_max_connections());

    for (state, value) in [("idle", idle), ("in_use", size - idle), ("max", max)] {
        DB_POOL_CONNECTIONS
            .with_label_values(&[service, state])
            .set(value);
    }
}

fn acquire_outcome(result: &Result<PoolConnection<Postgres>, sqlx::Error>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(sqlx::Error::PoolTimedOut) => "timeout",
        Err(sqlx::Error::PoolClosed) => "closed",
        Err(_) => "error",
    }
}

/// `pool.acquire()` with the wait recorded under `service`.
pub async fn acquire_with_metrics(
    pool: &PgPool,
    service: &str,
) -> Result<PoolConnection<Postgres>, sqlx::Error> {
    let start = Instant::now();
    let result = pool.acquire().await;

    DB_POOL_ACQUIRE_SECONDS
        .with_label_values(&[service, acquire_outcome(&result)])
        .observe(start.elapsed().as_secs_f64());

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_outcome_labels() {
        assert_eq!(acquire_outcome(&Err(sqlx::Error::PoolTimedOut)), "timeout");
        assert_eq!(acquire_outcome(&Err(sqlx::Error::PoolClosed)), "closed");
        assert_eq!(acquire_outcome(&Err(sqlx::Error::RowNotFound)), "error");
    }
}
