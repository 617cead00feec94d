// Device fingerprint aggregate
// One row per fingerprint, upserted whenever a shared device is flagged

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceFingerprint {
    pub fingerprint: String,
    pub total_workers_count: u32,
    pub flagged: bool,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceFingerprintUpdate {
    pub fingerprint: String,
    pub total_workers_count: u32,
    pub flagged: bool,
    pub seen_at: DateTime<Utc>,
}

impl DeviceFingerprint {
    /// Applies an update, keeping the original first sighting.
    pub fn merged(existing: Option<&DeviceFingerprint>, update: &DeviceFingerprintUpdate) -> Self {
        Self {
            fingerprint: update.fingerprint.clone(),
            total_workers_count: update.total_workers_count,
            flagged: update.flagged,
            first_seen_at: existing
                .map(|device| device.first_seen_at)
                .unwrap_or(update.seen_at),
            last_seen_at: update.seen_at,
        }
    }
}
