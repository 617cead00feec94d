use tracing::error;

use crate::{AppError, AppState};
use backend_domain::utils::DayWindow;
use backend_domain::{Anomaly, AnomalyFilter, AnomalyQuery, AnomalyStats};

pub const DEFAULT_LIST_LIMIT: usize = 200;
pub const MAX_LIST_LIMIT: usize = 1000;

pub async fn list_anomalies(
    state: &AppState,
    query: AnomalyQuery,
) -> Result<Vec<Anomaly>, AppError> {
    let window = query
        .date
        .map(DayWindow::for_day)
        .unwrap_or_else(DayWindow::today);
    let filter = AnomalyFilter {
        window,
        anomaly_type: query.anomaly_type,
        resolved: query.resolved,
        limit: query
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT),
    };
    let rows = state
        .anomaly_repo
        .fetch_anomalies(&filter)
        .await
        .map_err(|err| {
            error!("failed to fetch anomalies: {}", err);
            AppError::store(err)
        })?;
    Ok(rows)
}

pub async fn get_stats(state: &AppState, window: DayWindow) -> Result<AnomalyStats, AppError> {
    let counts = state
        .anomaly_repo
        .fetch_type_severity_counts(&window)
        .await
        .map_err(|err| {
            error!("failed to count anomalies for {}: {}", window.day, err);
            AppError::store(err)
        })?;
    Ok(AnomalyStats::from_counts(&counts))
}
