use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::{AppError, AppState};
use backend_domain::services::{
    detect_buddy_punching,
    detect_impossible_travel,
    evaluate_shared_device,
    scan_buddy_punching,
    scan_impossible_travel,
    scan_shared_devices,
};
use backend_domain::utils::{local_day, DayWindow};
use backend_domain::{Anomaly, AttendanceRecord, DetectionOutcome, ScanSummary};

/// Runs the three detectors against one fresh check-in and persists what they find.
/// Store failures propagate; the check-in boundary decides whether to swallow them.
pub async fn check_attendance(
    state: &AppState,
    record: &AttendanceRecord,
) -> Result<DetectionOutcome, AppError> {
    record.validate()?;
    let rules = &state.config.thresholds;
    let at = record.check_in_time;
    let mut anomalies = Vec::new();
    let located = match record.require_position() {
        Ok(_) => true,
        Err(err) => {
            debug!("geo checks skipped: {}", err);
            false
        }
    };

    if located {
        let recent = state
            .attendance_repo
            .fetch_check_ins_between(at - rules.buddy_window(), at, &record.worker_id)
            .await
            .map_err(AppError::store)?;
        anomalies.extend(detect_buddy_punching(record, &recent, rules));
    }

    if let Some(fingerprint) = record.fingerprint() {
        let others = state
            .attendance_repo
            .fetch_device_workers(fingerprint, &record.worker_id)
            .await
            .map_err(AppError::store)?;
        if let Some(finding) = evaluate_shared_device(record, &others, rules, Utc::now()) {
            state
                .device_repo
                .upsert_device(&finding.device)
                .await
                .map_err(AppError::store)?;
            anomalies.push(finding.anomaly);
        }
    }

    if located {
        let last = state
            .location_repo
            .fetch_last_location(&record.worker_id, at - rules.travel_lookback(), at)
            .await
            .map_err(AppError::store)?;
        anomalies.extend(detect_impossible_travel(record, last.as_ref(), rules));
    }

    let day = local_day(at);
    let anomalies = anomalies
        .into_iter()
        .map(|anomaly| anomaly.keyed_for(day))
        .collect::<Vec<_>>();
    if !anomalies.is_empty() {
        state
            .anomaly_repo
            .insert_anomalies(&anomalies)
            .await
            .map_err(AppError::store)?;
        state.metrics.record_anomalies(anomalies.len());
        info!(
            attendance_id = %record.id,
            worker_id = %record.worker_id,
            count = anomalies.len(),
            "incremental check flagged anomalies"
        );
    }

    state.metrics.record_incremental_check();
    Ok(DetectionOutcome::new(anomalies))
}

/// Re-evaluates one whole day. Results are persisted; on a store failure the
/// error still reports how many logs had been loaded.
pub async fn run_full_scan(state: &AppState, window: DayWindow) -> Result<ScanSummary, AppError> {
    info!(day = %window.day, "full scan started");
    let records = state
        .attendance_repo
        .fetch_day_check_ins(&window)
        .await
        .map_err(|err| {
            error!("failed to load check-ins for {}: {}", window.day, err);
            AppError::ScanFailed {
                logs_scanned: 0,
                source: err,
            }
        })?;
    let logs_scanned = records.len();

    let skipped = records.iter().filter(|record| record.validate().is_err()).count();
    if skipped > 0 {
        warn!(day = %window.day, skipped, "malformed check-ins skipped");
    }

    let anomalies = scan_day(state, &records)
        .into_iter()
        .map(|anomaly| anomaly.keyed_for(window.day))
        .collect::<Vec<_>>();
    let anomalies = if state.config.full_scan_dedup {
        drop_known(state, &window, anomalies, logs_scanned).await?
    } else {
        anomalies
    };

    if !anomalies.is_empty() {
        state
            .anomaly_repo
            .insert_anomalies(&anomalies)
            .await
            .map_err(|err| {
                error!("failed to persist full scan results for {}: {}", window.day, err);
                AppError::ScanFailed {
                    logs_scanned,
                    source: err,
                }
            })?;
    }

    state.metrics.record_full_scan(logs_scanned);
    state.metrics.record_anomalies(anomalies.len());
    info!(
        day = %window.day,
        logs_scanned,
        anomalies = anomalies.len(),
        "full scan finished"
    );
    Ok(ScanSummary {
        logs_scanned,
        anomalies_detected: anomalies.len(),
        anomalies,
    })
}

fn scan_day(state: &AppState, records: &[AttendanceRecord]) -> Vec<Anomaly> {
    let rules = &state.config.thresholds;
    let mut anomalies = scan_buddy_punching(records, rules);
    anomalies.extend(scan_shared_devices(records, rules));
    anomalies.extend(scan_impossible_travel(records, rules));
    anomalies
}

async fn drop_known(
    state: &AppState,
    window: &DayWindow,
    anomalies: Vec<Anomaly>,
    logs_scanned: usize,
) -> Result<Vec<Anomaly>, AppError> {
    let known = state
        .anomaly_repo
        .fetch_dedup_keys(window)
        .await
        .map_err(|err| AppError::ScanFailed {
            logs_scanned,
            source: err,
        })?;
    let before = anomalies.len();
    let fresh = anomalies
        .into_iter()
        .filter(|anomaly| !known.contains(&anomaly.dedup_key))
        .collect::<Vec<_>>();
    if fresh.len() < before {
        info!(day = %window.day, dropped = before - fresh.len(), "known anomalies skipped");
    }
    Ok(fresh)
}
