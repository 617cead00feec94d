use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use backend_application::commands::{anomaly_commands, detection_commands};
use backend_application::queries::anomaly_queries;
use backend_application::{dispatch, AppState, GhostDetectionRequest, GhostDetectionResponse};
use backend_domain::utils::DayWindow;
use backend_domain::{
    Anomaly,
    AnomalyQuery,
    AnomalyStats,
    AttendanceRecord,
    DateQuery,
    DetectionOutcome,
    ResolveRequest,
    ScanSummary,
};

use crate::error::HttpError;
use crate::middleware::authorize;

fn window_for(query: &DateQuery) -> DayWindow {
    query.date.map(DayWindow::for_day).unwrap_or_else(DayWindow::today)
}

pub async fn check_attendance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(record): Json<AttendanceRecord>,
) -> Result<Json<DetectionOutcome>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let outcome = detection_commands::check_attendance(&state, &record).await?;
    Ok(Json(outcome))
}

pub async fn run_full_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DateQuery>,
) -> Result<Json<ScanSummary>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let summary = detection_commands::run_full_scan(&state, window_for(&query)).await?;
    Ok(Json(summary))
}

pub async fn list_anomalies(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AnomalyQuery>,
) -> Result<Json<Vec<Anomaly>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let rows = anomaly_queries::list_anomalies(&state, query).await?;
    Ok(Json(rows))
}

pub async fn get_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DateQuery>,
) -> Result<Json<AnomalyStats>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let stats = anomaly_queries::get_stats(&state, window_for(&query)).await?;
    Ok(Json(stats))
}

pub async fn resolve_anomaly(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(anomaly_id): Path<String>,
    Json(payload): Json<ResolveRequest>,
) -> Result<StatusCode, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    anomaly_commands::resolve_anomaly(&state, &anomaly_id, &payload.resolved_by).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn ghost_detection(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<GhostDetectionRequest>,
) -> Result<Json<GhostDetectionResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let response = dispatch(&state, request).await?;
    Ok(Json(response))
}
