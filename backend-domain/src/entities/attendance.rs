// Attendance entities
// Check-ins and location samples produced by the check-in path; read-only to the scanner

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMethod {
    #[default]
    Rfid,
    Face,
    Manual,
    #[serde(other)]
    Other,
}

impl VerificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationMethod::Rfid => "rfid",
            VerificationMethod::Face => "face",
            VerificationMethod::Manual => "manual",
            VerificationMethod::Other => "other",
        }
    }
}

impl fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rfid" => Ok(VerificationMethod::Rfid),
            "face" => Ok(VerificationMethod::Face),
            "manual" => Ok(VerificationMethod::Manual),
            "other" => Ok(VerificationMethod::Other),
            other => Err(DomainError::UnknownVariant {
                kind: "verification_method",
                value: other.to_string(),
            }),
        }
    }
}

/// Worker identity joined onto a check-in for human-readable descriptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerProfile {
    pub employee_id: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub worker_id: String,
    pub check_in_time: DateTime<Utc>,
    #[serde(default)]
    pub check_out_time: Option<DateTime<Utc>>,
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
    pub verification_method: VerificationMethod,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<WorkerProfile>,
}

impl AttendanceRecord {
    pub fn position(&self) -> Option<GeoPoint> {
        GeoPoint::from_parts(self.latitude, self.longitude)
    }

    pub fn require_position(&self) -> Result<GeoPoint, DomainError> {
        self.position()
            .ok_or_else(|| DomainError::MissingGeoData(self.id.clone()))
    }

    /// Fingerprint with surrounding whitespace removed; blank values count as absent.
    pub fn fingerprint(&self) -> Option<&str> {
        self.device_fingerprint
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Employee id when the worker identity is joined, otherwise the raw worker id.
    pub fn worker_label(&self) -> &str {
        self.worker
            .as_ref()
            .map(|profile| profile.employee_id.as_str())
            .filter(|label| !label.trim().is_empty())
            .unwrap_or(&self.worker_id)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.trim().is_empty() {
            return Err(DomainError::InputMalformed("attendance id is empty".to_string()));
        }
        if self.worker_id.trim().is_empty() {
            return Err(DomainError::InputMalformed(format!(
                "attendance {} has no worker_id",
                self.id
            )));
        }
        if let Some(point) = self.position() {
            if !point.is_in_range() {
                return Err(DomainError::InputMalformed(format!(
                    "attendance {} has out-of-range coordinates ({}, {})",
                    self.id, point.latitude, point.longitude
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerLocation {
    pub id: String,
    pub worker_id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

impl WorkerLocation {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Location sample taken at the moment of a check-in.
    pub fn from_check_in(record: &AttendanceRecord) -> Option<Self> {
        let point = record.position()?;
        Some(Self {
            id: uuid::Uuid::new_v4().to_string(),
            worker_id: record.worker_id.clone(),
            latitude: point.latitude,
            longitude: point.longitude,
            zone: record.zone.clone(),
            accuracy: None,
            recorded_at: record.check_in_time,
        })
    }
}
