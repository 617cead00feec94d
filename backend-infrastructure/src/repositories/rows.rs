// ClickHouse row shapes and their mapping onto domain entities

use anyhow::{anyhow, Result};
use clickhouse::Row;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use backend_domain::{
    Anomaly,
    AnomalyType,
    AttendanceRecord,
    DeviceFingerprint,
    Severity,
    VerificationMethod,
    WorkerLocation,
    WorkerProfile,
};

use crate::utils::{from_millis, from_offset, none_if_empty, to_offset};

pub const ATTENDANCE_COLUMNS: &str = "id, worker_id, check_in_time, check_out_time, latitude, longitude, \
device_fingerprint, ip_address, zone, verification_method, is_verified";

pub const LOCATION_COLUMNS: &str = "id, worker_id, latitude, longitude, zone, accuracy, recorded_at";

pub const ANOMALY_COLUMNS: &str = "id, created_at, anomaly_type, severity, title, description, worker_ids, \
attendance_log_ids, zone, latitude, longitude, metadata_json, dedup_key, is_resolved, resolved_at, resolved_by";

pub const DEVICE_COLUMNS: &str = "fingerprint, total_workers_count, flagged, first_seen_at, last_seen_at";

#[derive(Debug, Clone, Serialize, Deserialize, Row)]
pub struct AttendanceLogRow {
    pub id: String,
    pub worker_id: String,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub check_in_time: OffsetDateTime,
    pub check_out_time: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub device_fingerprint: String,
    pub ip_address: String,
    pub zone: String,
    pub verification_method: String,
    pub is_verified: bool,
}

/// Attendance row with the worker identity from a `LEFT JOIN workers`.
#[derive(Debug, Clone, Deserialize, Row)]
pub struct JoinedAttendanceRow {
    pub id: String,
    pub worker_id: String,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub check_in_time: OffsetDateTime,
    pub check_out_time: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub device_fingerprint: String,
    pub ip_address: String,
    pub zone: String,
    pub verification_method: String,
    pub is_verified: bool,
    pub employee_id: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Row)]
pub struct WorkerLocationRow {
    pub id: String,
    pub worker_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub zone: Option<String>,
    pub accuracy: Option<f64>,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub recorded_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Row)]
pub struct AnomalyRecordRow {
    pub id: String,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub created_at: OffsetDateTime,
    pub anomaly_type: String,
    pub severity: String,
    pub title: String,
    pub description: String,
    pub worker_ids: Vec<String>,
    pub attendance_log_ids: Vec<String>,
    pub zone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub metadata_json: String,
    pub dedup_key: String,
    pub is_resolved: bool,
    pub resolved_at: Option<i64>,
    pub resolved_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Row)]
pub struct DeviceFingerprintRow {
    pub fingerprint: String,
    pub total_workers_count: u32,
    pub flagged: bool,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub first_seen_at: OffsetDateTime,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub last_seen_at: OffsetDateTime,
}

/// Values outside the known set were written by other clients; they read back as `Other`.
fn read_verification_method(value: &str) -> VerificationMethod {
    value.parse().unwrap_or(VerificationMethod::Other)
}

impl From<&AttendanceRecord> for AttendanceLogRow {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            id: record.id.clone(),
            worker_id: record.worker_id.clone(),
            check_in_time: to_offset(record.check_in_time),
            check_out_time: record.check_out_time.map(|at| at.timestamp_millis()),
            latitude: record.latitude,
            longitude: record.longitude,
            device_fingerprint: record.fingerprint().unwrap_or_default().to_string(),
            ip_address: record.ip_address.clone().unwrap_or_default(),
            zone: record.zone.clone().unwrap_or_default(),
            verification_method: record.verification_method.as_str().to_string(),
            is_verified: record.is_verified,
        }
    }
}

impl From<AttendanceLogRow> for AttendanceRecord {
    fn from(row: AttendanceLogRow) -> Self {
        Self {
            id: row.id,
            worker_id: row.worker_id,
            check_in_time: from_offset(row.check_in_time),
            check_out_time: row.check_out_time.map(from_millis),
            latitude: row.latitude,
            longitude: row.longitude,
            device_fingerprint: none_if_empty(row.device_fingerprint),
            ip_address: none_if_empty(row.ip_address),
            zone: none_if_empty(row.zone),
            verification_method: read_verification_method(&row.verification_method),
            is_verified: row.is_verified,
            worker: None,
        }
    }
}

impl From<JoinedAttendanceRow> for AttendanceRecord {
    fn from(row: JoinedAttendanceRow) -> Self {
        let worker = if row.employee_id.trim().is_empty() && row.full_name.trim().is_empty() {
            None
        } else {
            Some(WorkerProfile {
                employee_id: row.employee_id,
                full_name: row.full_name,
            })
        };
        Self {
            id: row.id,
            worker_id: row.worker_id,
            check_in_time: from_offset(row.check_in_time),
            check_out_time: row.check_out_time.map(from_millis),
            latitude: row.latitude,
            longitude: row.longitude,
            device_fingerprint: none_if_empty(row.device_fingerprint),
            ip_address: none_if_empty(row.ip_address),
            zone: none_if_empty(row.zone),
            verification_method: read_verification_method(&row.verification_method),
            is_verified: row.is_verified,
            worker,
        }
    }
}

impl From<&WorkerLocation> for WorkerLocationRow {
    fn from(location: &WorkerLocation) -> Self {
        Self {
            id: location.id.clone(),
            worker_id: location.worker_id.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
            zone: location.zone.clone(),
            accuracy: location.accuracy,
            recorded_at: to_offset(location.recorded_at),
        }
    }
}

impl From<WorkerLocationRow> for WorkerLocation {
    fn from(row: WorkerLocationRow) -> Self {
        Self {
            id: row.id,
            worker_id: row.worker_id,
            latitude: row.latitude,
            longitude: row.longitude,
            zone: row.zone,
            accuracy: row.accuracy,
            recorded_at: from_offset(row.recorded_at),
        }
    }
}

impl TryFrom<&Anomaly> for AnomalyRecordRow {
    type Error = anyhow::Error;

    fn try_from(anomaly: &Anomaly) -> Result<Self> {
        Ok(Self {
            id: anomaly.id.clone(),
            created_at: to_offset(anomaly.created_at),
            anomaly_type: anomaly.anomaly_type.as_str().to_string(),
            severity: anomaly.severity.as_str().to_string(),
            title: anomaly.title.clone(),
            description: anomaly.description.clone(),
            worker_ids: anomaly.worker_ids.clone(),
            attendance_log_ids: anomaly.attendance_log_ids.clone(),
            zone: anomaly.zone.clone(),
            latitude: anomaly.latitude,
            longitude: anomaly.longitude,
            metadata_json: serde_json::to_string(&anomaly.metadata)?,
            dedup_key: anomaly.dedup_key.clone(),
            is_resolved: anomaly.is_resolved,
            resolved_at: anomaly.resolved_at.map(|at| at.timestamp_millis()),
            resolved_by: anomaly.resolved_by.clone(),
        })
    }
}

impl TryFrom<AnomalyRecordRow> for Anomaly {
    type Error = anyhow::Error;

    fn try_from(row: AnomalyRecordRow) -> Result<Self> {
        let anomaly_type: AnomalyType = row
            .anomaly_type
            .parse()
            .map_err(|err| anyhow!("anomaly {}: {}", row.id, err))?;
        let severity: Severity = row
            .severity
            .parse()
            .map_err(|err| anyhow!("anomaly {}: {}", row.id, err))?;
        let metadata = if row.metadata_json.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&row.metadata_json)?
        };
        Ok(Self {
            id: row.id,
            created_at: from_offset(row.created_at),
            anomaly_type,
            severity,
            title: row.title,
            description: row.description,
            worker_ids: row.worker_ids,
            attendance_log_ids: row.attendance_log_ids,
            zone: row.zone,
            latitude: row.latitude,
            longitude: row.longitude,
            metadata,
            dedup_key: row.dedup_key,
            is_resolved: row.is_resolved,
            resolved_at: row.resolved_at.map(from_millis),
            resolved_by: row.resolved_by,
        })
    }
}

impl From<DeviceFingerprintRow> for DeviceFingerprint {
    fn from(row: DeviceFingerprintRow) -> Self {
        Self {
            fingerprint: row.fingerprint,
            total_workers_count: row.total_workers_count,
            flagged: row.flagged,
            first_seen_at: from_offset(row.first_seen_at),
            last_seen_at: from_offset(row.last_seen_at),
        }
    }
}

impl From<&DeviceFingerprint> for DeviceFingerprintRow {
    fn from(device: &DeviceFingerprint) -> Self {
        Self {
            fingerprint: device.fingerprint.clone(),
            total_workers_count: device.total_workers_count,
            flagged: device.flagged,
            first_seen_at: to_offset(device.first_seen_at),
            last_seen_at: to_offset(device.last_seen_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn anomaly_row_keeps_metadata_and_resolution() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).single().expect("ts");
        let mut anomaly = Anomaly::new(
            AnomalyType::SharedDevice,
            Severity::Critical,
            "Shared Ghost Device Detected",
            "10 different workers",
            vec!["W1".to_string()],
        )
        .expect("anomaly")
        .with_metadata(json!({"device_fingerprint": "DEV-X", "total_workers": 10}));
        anomaly.resolve("inspector1", at);

        let row = AnomalyRecordRow::try_from(&anomaly).expect("row");
        assert_eq!(row.anomaly_type, "shared_device");
        assert_eq!(row.severity, "critical");
        assert_eq!(row.resolved_at, Some(at.timestamp_millis()));

        let back = Anomaly::try_from(row).expect("anomaly");
        assert_eq!(back.metadata["total_workers"], 10);
        assert_eq!(back.resolved_by.as_deref(), Some("inspector1"));
        assert_eq!(back.resolved_at, Some(at));
    }

    #[test]
    fn unknown_anomaly_type_is_rejected() {
        let row = AnomalyRecordRow {
            id: "a1".to_string(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            anomaly_type: "time_theft".to_string(),
            severity: "high".to_string(),
            title: String::new(),
            description: "d".to_string(),
            worker_ids: vec!["W1".to_string()],
            attendance_log_ids: Vec::new(),
            zone: None,
            latitude: None,
            longitude: None,
            metadata_json: String::new(),
            dedup_key: String::new(),
            is_resolved: false,
            resolved_at: None,
            resolved_by: None,
        };
        assert!(Anomaly::try_from(row).is_err());
    }

    #[test]
    fn joined_row_without_worker_has_no_profile() {
        let row = JoinedAttendanceRow {
            id: "l1".to_string(),
            worker_id: "W1".to_string(),
            check_in_time: OffsetDateTime::UNIX_EPOCH,
            check_out_time: None,
            latitude: Some(28.7),
            longitude: Some(77.1),
            device_fingerprint: String::new(),
            ip_address: String::new(),
            zone: "Rohini".to_string(),
            verification_method: "face".to_string(),
            is_verified: true,
            employee_id: String::new(),
            full_name: String::new(),
        };
        let record = AttendanceRecord::from(row);
        assert!(record.worker.is_none());
        assert!(record.device_fingerprint.is_none());
        assert_eq!(record.verification_method, VerificationMethod::Face);
        assert_eq!(record.worker_label(), "W1");
    }

    #[test]
    fn unknown_verification_methods_read_back_as_other() {
        assert_eq!(read_verification_method("Manual"), VerificationMethod::Manual);
        assert_eq!(read_verification_method("fingerprint"), VerificationMethod::Other);
    }
}
