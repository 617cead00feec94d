use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entities::{Anomaly, AttendanceRecord, DetectionThresholds};
use crate::value_objects::{AnomalyType, Severity};

/// Result of an incremental check against a single check-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionOutcome {
    pub anomalies_detected: usize,
    pub anomalies: Vec<Anomaly>,
}

impl DetectionOutcome {
    pub fn new(anomalies: Vec<Anomaly>) -> Self {
        Self {
            anomalies_detected: anomalies.len(),
            anomalies,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub logs_scanned: usize,
    pub anomalies_detected: usize,
    pub anomalies: Vec<Anomaly>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountByType {
    pub buddy_punching: u64,
    pub shared_device: u64,
    pub impossible_travel: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountBySeverity {
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyStats {
    pub total: u64,
    pub by_type: CountByType,
    pub by_severity: CountBySeverity,
}

/// One `GROUP BY anomaly_type, severity` bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnomalyCount {
    pub anomaly_type: AnomalyType,
    pub severity: Severity,
    pub count: u64,
}

impl AnomalyStats {
    pub fn from_counts(counts: &[AnomalyCount]) -> Self {
        let mut stats = AnomalyStats::default();
        for bucket in counts {
            stats.total += bucket.count;
            match bucket.anomaly_type {
                AnomalyType::BuddyPunching => stats.by_type.buddy_punching += bucket.count,
                AnomalyType::SharedDevice => stats.by_type.shared_device += bucket.count,
                AnomalyType::ImpossibleTravel => stats.by_type.impossible_travel += bucket.count,
            }
            match bucket.severity {
                Severity::Critical => stats.by_severity.critical += bucket.count,
                Severity::High => stats.by_severity.high += bucket.count,
                Severity::Medium => stats.by_severity.medium += bucket.count,
                Severity::Low => stats.by_severity.low += bucket.count,
            }
        }
        stats
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnomalyQuery {
    pub date: Option<NaiveDate>,
    pub anomaly_type: Option<AnomalyType>,
    pub resolved: Option<bool>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct AnomalyFilter {
    pub window: crate::utils::DayWindow,
    pub anomaly_type: Option<AnomalyType>,
    pub resolved: Option<bool>,
    pub limit: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveRequest {
    pub resolved_by: String,
}

/// Check-in submitted by a capture device. The scanner fills in id and time when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckInRequest {
    pub worker_id: String,
    #[serde(default)]
    pub check_in_time: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub device_fingerprint: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub verification_method: crate::entities::VerificationMethod,
    /// Devices vouch for their own captures unless they say otherwise.
    #[serde(default = "verified_by_default")]
    pub is_verified: bool,
}

fn verified_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckInResponse {
    pub attendance: AttendanceRecord,
    pub detection: Option<DetectionOutcome>,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub thresholds: DetectionThresholds,
    pub full_scan_enabled: bool,
    pub full_scan_hour: u32,
    pub full_scan_minute: u32,
    pub full_scan_dedup: bool,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3234".to_string(),
            api_token: None,
            thresholds: DetectionThresholds::default(),
            full_scan_enabled: false,
            full_scan_hour: 23,
            full_scan_minute: 30,
            full_scan_dedup: false,
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Clickhouse,
    Memory,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub storage_backend: StorageBackend,
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
}
