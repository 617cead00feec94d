use chrono::Utc;
use tracing::info;

use crate::{AppError, AppState};

/// Marks an anomaly resolved. Resolving twice is not an error; the first resolver is kept.
pub async fn resolve_anomaly(
    state: &AppState,
    anomaly_id: &str,
    resolved_by: &str,
) -> Result<(), AppError> {
    let anomaly_id = anomaly_id.trim();
    let resolved_by = resolved_by.trim();
    if anomaly_id.is_empty() {
        return Err(AppError::BadRequest("anomaly_id is required".to_string()));
    }
    if resolved_by.is_empty() {
        return Err(AppError::BadRequest("resolved_by is required".to_string()));
    }

    let exists = state
        .anomaly_repo
        .anomaly_exists(anomaly_id)
        .await
        .map_err(AppError::store)?;
    if !exists {
        return Err(AppError::NotFound(format!("anomaly {}", anomaly_id)));
    }

    let changed = state
        .anomaly_repo
        .resolve_anomaly(anomaly_id, resolved_by, Utc::now())
        .await
        .map_err(AppError::store)?;
    if changed {
        state.metrics.record_resolved();
        info!(anomaly_id, resolved_by, "anomaly resolved");
    }
    Ok(())
}
