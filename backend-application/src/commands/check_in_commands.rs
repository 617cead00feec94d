use chrono::Utc;
use tracing::{error, warn};

use crate::commands::check_attendance;
use crate::{AppError, AppState};
use backend_domain::{AttendanceRecord, CheckInRequest, CheckInResponse, WorkerLocation};

/// Records a check-in. Only the attendance write can fail the call; detection
/// and the location sample are best effort.
pub async fn record_check_in(
    state: &AppState,
    request: CheckInRequest,
) -> Result<CheckInResponse, AppError> {
    let record = AttendanceRecord {
        id: uuid::Uuid::new_v4().to_string(),
        worker_id: request.worker_id.trim().to_string(),
        check_in_time: request.check_in_time.unwrap_or_else(Utc::now),
        check_out_time: None,
        latitude: request.latitude,
        longitude: request.longitude,
        device_fingerprint: request.device_fingerprint,
        ip_address: request.ip_address,
        zone: request.zone,
        verification_method: request.verification_method,
        is_verified: request.is_verified,
        worker: None,
    };
    if record.latitude.is_some() != record.longitude.is_some() {
        return Err(AppError::BadRequest(
            "latitude and longitude must be sent together".to_string(),
        ));
    }
    record.validate()?;

    state
        .attendance_repo
        .insert_attendance(&record)
        .await
        .map_err(|err| {
            error!("failed to insert attendance {}: {}", record.id, err);
            AppError::store(err)
        })?;
    state.metrics.record_check_in();

    // runs before the location sample so travel never compares a check-in with itself
    let detection = match check_attendance(state, &record).await {
        Ok(outcome) => Some(outcome),
        Err(err) => {
            state.metrics.record_detection_failure();
            warn!(attendance_id = %record.id, "detection failed, check-in kept: {}", err);
            None
        }
    };

    if let Some(location) = WorkerLocation::from_check_in(&record) {
        if let Err(err) = state.location_repo.insert_location(&location).await {
            warn!(attendance_id = %record.id, "failed to record location sample: {}", err);
        }
    }

    Ok(CheckInResponse {
        attendance: record,
        detection,
    })
}
