// Anomaly entity
// A fraud signal raised by one of the detectors

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::DomainError;
use crate::value_objects::{AnomalyType, GeoPoint, Severity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub anomaly_type: AnomalyType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub worker_ids: Vec<String>,
    #[serde(default)]
    pub attendance_log_ids: Vec<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub dedup_key: String,
    #[serde(default)]
    pub is_resolved: bool,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_by: Option<String>,
}

impl Anomaly {
    /// Creates an unresolved anomaly. Rejects an empty worker set or a blank description.
    pub fn new(
        anomaly_type: AnomalyType,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
        worker_ids: Vec<String>,
    ) -> Result<Self, DomainError> {
        let description = description.into();
        if worker_ids.is_empty() {
            return Err(DomainError::InputMalformed(format!(
                "{} anomaly without workers",
                anomaly_type
            )));
        }
        if description.trim().is_empty() {
            return Err(DomainError::InputMalformed(format!(
                "{} anomaly without description",
                anomaly_type
            )));
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            anomaly_type,
            severity,
            title: title.into(),
            description,
            worker_ids,
            attendance_log_ids: Vec::new(),
            zone: None,
            latitude: None,
            longitude: None,
            metadata: serde_json::Value::Null,
            dedup_key: String::new(),
            is_resolved: false,
            resolved_at: None,
            resolved_by: None,
        })
    }

    pub fn with_log_ids(mut self, ids: Vec<String>) -> Self {
        self.attendance_log_ids = ids;
        self
    }

    pub fn with_zone(mut self, zone: Option<String>) -> Self {
        self.zone = zone;
        self
    }

    pub fn with_location(mut self, point: Option<GeoPoint>) -> Self {
        self.latitude = point.map(|p| p.latitude);
        self.longitude = point.map(|p| p.longitude);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Stamps the cross-run dedup key for the day the evidence belongs to.
    pub fn keyed_for(mut self, day: NaiveDate) -> Self {
        self.dedup_key = dedup_key(
            self.anomaly_type,
            &self.worker_ids,
            &self.attendance_log_ids,
            day,
        );
        self
    }

    /// Marks the anomaly resolved. Returns false when it was already resolved,
    /// in which case the first resolution is kept.
    pub fn resolve(&mut self, resolved_by: &str, at: DateTime<Utc>) -> bool {
        if self.is_resolved {
            return false;
        }
        self.is_resolved = true;
        self.resolved_at = Some(at);
        self.resolved_by = Some(resolved_by.to_string());
        true
    }
}

/// sha256 over type, sorted worker ids, sorted log ids and day.
pub fn dedup_key(
    anomaly_type: AnomalyType,
    worker_ids: &[String],
    log_ids: &[String],
    day: NaiveDate,
) -> String {
    let mut workers = worker_ids.to_vec();
    workers.sort();
    workers.dedup();
    let mut logs = log_ids.to_vec();
    logs.sort();
    logs.dedup();

    let mut hasher = Sha256::new();
    hasher.update(anomaly_type.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(workers.join(",").as_bytes());
    hasher.update(b"|");
    hasher.update(logs.join(",").as_bytes());
    hasher.update(b"|");
    hasher.update(day.format("%Y-%m-%d").to_string().as_bytes());
    let digest = hasher.finalize();

    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
