use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::entities::{Anomaly, AttendanceRecord, DetectionThresholds, DeviceFingerprintUpdate};
use crate::value_objects::AnomalyType;

const TITLE: &str = "Shared Ghost Device Detected";

/// A flagged device together with the aggregate row to upsert for it.
#[derive(Debug, Clone)]
pub struct SharedDeviceFinding {
    pub anomaly: Anomaly,
    pub device: DeviceFingerprintUpdate,
}

/// Checks a fresh check-in's device against the distinct workers that used it before.
/// `other_workers` excludes the candidate's own worker.
pub fn evaluate_shared_device(
    candidate: &AttendanceRecord,
    other_workers: &[String],
    rules: &DetectionThresholds,
    seen_at: DateTime<Utc>,
) -> Option<SharedDeviceFinding> {
    if candidate.validate().is_err() {
        return None;
    }
    let fingerprint = candidate.fingerprint()?;

    let mut workers = vec![candidate.worker_id.clone()];
    for worker in other_workers {
        if !worker.trim().is_empty() && !workers.contains(worker) {
            workers.push(worker.clone());
        }
    }
    let total = workers.len();
    let severity = rules.shared_device_severity(total)?;

    let anomaly = Anomaly::new(
        AnomalyType::SharedDevice,
        severity,
        TITLE,
        format!(
            "{} different workers have checked in using the same device. This device may be used for mass proxy attendance.",
            total
        ),
        workers,
    )
    .ok()?
    .with_zone(candidate.zone.clone())
    .with_metadata(json!({
        "device_fingerprint": fingerprint,
        "total_workers": total,
    }));

    Some(SharedDeviceFinding {
        anomaly,
        device: DeviceFingerprintUpdate {
            fingerprint: fingerprint.to_string(),
            total_workers_count: u32::try_from(total).unwrap_or(u32::MAX),
            flagged: true,
            seen_at,
        },
    })
}

/// Groups one day of check-ins by device and flags devices shared by too many workers.
pub fn scan_shared_devices(records: &[AttendanceRecord], rules: &DetectionThresholds) -> Vec<Anomaly> {
    let mut order: Vec<(&str, Vec<&str>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for record in records.iter().filter(|record| record.validate().is_ok()) {
        let Some(fingerprint) = record.fingerprint() else {
            continue;
        };
        let slot = *index.entry(fingerprint).or_insert_with(|| {
            order.push((fingerprint, Vec::new()));
            order.len() - 1
        });
        let workers = &mut order[slot].1;
        if !workers.contains(&record.worker_id.as_str()) {
            workers.push(record.worker_id.as_str());
        }
    }

    order
        .into_iter()
        .filter_map(|(fingerprint, workers)| {
            let total = workers.len();
            let severity = rules.shared_device_severity(total)?;
            let anomaly = Anomaly::new(
                AnomalyType::SharedDevice,
                severity,
                TITLE,
                format!("{} workers used the same device for attendance on the same day.", total),
                workers.into_iter().map(str::to_string).collect(),
            )
            .ok()?;
            Some(anomaly.with_metadata(json!({
                "device_fingerprint": fingerprint,
                "total_workers": total,
            })))
        })
        .collect()
}
