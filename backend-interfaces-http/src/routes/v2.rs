use axum::Router;

use backend_application::AppState;

use crate::handlers::{check_in_handlers, detect_handlers, ops_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v2/attendance/check-in",
            axum::routing::post(check_in_handlers::record_check_in),
        )
        .route(
            "/v2/detect/check",
            axum::routing::post(detect_handlers::check_attendance),
        )
        .route(
            "/v2/detect/scan",
            axum::routing::post(detect_handlers::run_full_scan),
        )
        .route(
            "/v2/detect/anomalies",
            axum::routing::get(detect_handlers::list_anomalies),
        )
        .route(
            "/v2/detect/anomalies/:id/resolve",
            axum::routing::post(detect_handlers::resolve_anomaly),
        )
        .route(
            "/v2/detect/stats",
            axum::routing::get(detect_handlers::get_stats),
        )
        .route(
            "/v2/ghost-detection",
            axum::routing::post(detect_handlers::ghost_detection),
        )
        .route(
            "/v2/ops/health/live",
            axum::routing::get(ops_handlers::health_live),
        )
        .route(
            "/v2/ops/health/ready",
            axum::routing::get(ops_handlers::health_ready),
        )
        .route(
            "/v2/ops/metrics/prometheus",
            axum::routing::get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
