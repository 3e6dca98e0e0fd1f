use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, Encoder, Histogram, IntCounter, TextEncoder,
};

// Prometheus metrics (default registry)
pub static PREDICTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "price_predictor_predictions_total",
        "Total prediction requests handled"
    )
    .expect("register predictions_total")
});

pub static PREDICTION_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "price_predictor_prediction_errors_total",
        "Total prediction requests rejected or failed"
    )
    .expect("register prediction_errors_total")
});

pub static EXPLANATIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "price_predictor_explanations_total",
        "Total explanation calls attempted against the generative API"
    )
    .expect("register explanations_total")
});

pub static EXPLANATION_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "price_predictor_explanation_failures_total",
        "Total explanation calls that failed and were degraded"
    )
    .expect("register explanation_failures_total")
});

pub static PREDICTION_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "price_predictor_prediction_duration_seconds",
        "Prediction handler duration in seconds",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("register prediction_duration")
});

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
