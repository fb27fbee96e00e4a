use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};

lazy_static! {
    /// Duration of activity page requests by feed kind (board, thread, subscription).
    pub static ref ACTIVITY_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "activity_request_duration_seconds",
        "Activity page request duration segmented by feed kind",
        &["feed"]
    )
    .expect("failed to register activity_request_duration_seconds");

    /// Activity page requests by feed kind and outcome.
    pub static ref ACTIVITY_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "activity_requests_total",
        "Activity page requests segmented by feed kind and outcome",
        &["feed", "outcome"]
    )
    .expect("failed to register activity_requests_total");

    /// Rows returned by the activity store per request, lookahead included.
    pub static ref ACTIVITY_ROWS_FETCHED: HistogramVec = register_histogram_vec!(
        "activity_rows_fetched",
        "Rows read from the activity store per page",
        &["feed"],
        vec![0.0, 1.0, 5.0, 10.0, 11.0, 25.0, 50.0, 101.0]
    )
    .expect("failed to register activity_rows_fetched");

    /// HTTP request latency by method and status.
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "board_http_request_duration_seconds",
        "HTTP request latency segmented by method and status",
        &["method", "status"]
    )
    .expect("failed to register board_http_request_duration_seconds");
}
