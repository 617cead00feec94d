// Detection thresholds shared by the incremental and full-scan detectors

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::value_objects::Severity;

pub const BUDDY_PUNCH_WINDOW_SECONDS: i64 = 30;
pub const BUDDY_PUNCH_RADIUS_METERS: f64 = 10.0;
pub const MAX_TRAVEL_SPEED_KMH: f64 = 60.0;
pub const TRAVEL_FLOOR_KM: f64 = 5.0;
pub const TRAVEL_LOOKBACK_MINUTES: i64 = 120;
pub const SHARED_DEVICE_MIN_WORKERS: usize = 3;
pub const SHARED_DEVICE_CRITICAL_WORKERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionThresholds {
    pub buddy_window_seconds: i64,
    pub buddy_radius_meters: f64,
    pub max_travel_speed_kmh: f64,
    pub travel_floor_km: f64,
    pub travel_lookback_minutes: i64,
    pub shared_device_min_workers: usize,
    pub shared_device_critical_workers: usize,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            buddy_window_seconds: BUDDY_PUNCH_WINDOW_SECONDS,
            buddy_radius_meters: BUDDY_PUNCH_RADIUS_METERS,
            max_travel_speed_kmh: MAX_TRAVEL_SPEED_KMH,
            travel_floor_km: TRAVEL_FLOOR_KM,
            travel_lookback_minutes: TRAVEL_LOOKBACK_MINUTES,
            shared_device_min_workers: SHARED_DEVICE_MIN_WORKERS,
            shared_device_critical_workers: SHARED_DEVICE_CRITICAL_WORKERS,
        }
    }
}

impl DetectionThresholds {
    pub fn buddy_window(&self) -> Duration {
        Duration::seconds(self.buddy_window_seconds)
    }

    pub fn buddy_radius_km(&self) -> f64 {
        self.buddy_radius_meters / 1000.0
    }

    pub fn travel_lookback(&self) -> Duration {
        Duration::minutes(self.travel_lookback_minutes)
    }

    /// Severity for a device used by `worker_count` distinct workers, `None` below the minimum.
    pub fn shared_device_severity(&self, worker_count: usize) -> Option<Severity> {
        if worker_count < self.shared_device_min_workers {
            return None;
        }
        if worker_count >= self.shared_device_critical_workers {
            Some(Severity::Critical)
        } else {
            Some(Severity::High)
        }
    }
}
