use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::entities::{
    Anomaly,
    AnomalyCount,
    AnomalyFilter,
    AttendanceRecord,
    DeviceFingerprint,
    DeviceFingerprintUpdate,
    WorkerLocation,
};
use crate::utils::DayWindow;

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    async fn ensure_schema(&self) -> anyhow::Result<()>;
    async fn insert_attendance(&self, record: &AttendanceRecord) -> anyhow::Result<()>;
    /// Check-ins with `start <= check_in_time <= end`, excluding one worker's own rows.
    async fn fetch_check_ins_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_worker: &str,
    ) -> anyhow::Result<Vec<AttendanceRecord>>;
    /// Workers other than `exclude_worker` that ever checked in with this fingerprint.
    async fn fetch_device_workers(
        &self,
        fingerprint: &str,
        exclude_worker: &str,
    ) -> anyhow::Result<Vec<String>>;
    /// All check-ins of one day, worker identity joined where known.
    async fn fetch_day_check_ins(&self, window: &DayWindow) -> anyhow::Result<Vec<AttendanceRecord>>;
    async fn ping(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait WorkerLocationRepository: Send + Sync {
    async fn insert_location(&self, location: &WorkerLocation) -> anyhow::Result<()>;
    /// Newest sample with `since <= recorded_at < before`.
    async fn fetch_last_location(
        &self,
        worker_id: &str,
        since: DateTime<Utc>,
        before: DateTime<Utc>,
    ) -> anyhow::Result<Option<WorkerLocation>>;
}

#[async_trait]
pub trait AnomalyRepository: Send + Sync {
    async fn insert_anomalies(&self, anomalies: &[Anomaly]) -> anyhow::Result<()>;
    async fn fetch_anomalies(&self, filter: &AnomalyFilter) -> anyhow::Result<Vec<Anomaly>>;
    async fn fetch_type_severity_counts(&self, window: &DayWindow) -> anyhow::Result<Vec<AnomalyCount>>;
    async fn fetch_dedup_keys(&self, window: &DayWindow) -> anyhow::Result<HashSet<String>>;
    async fn anomaly_exists(&self, id: &str) -> anyhow::Result<bool>;
    /// Fails when the anomaly table cannot take writes.
    async fn ping(&self) -> anyhow::Result<()>;
    /// Returns false when the anomaly was already resolved; the first resolution stands.
    async fn resolve_anomaly(
        &self,
        id: &str,
        resolved_by: &str,
        resolved_at: DateTime<Utc>,
    ) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait DeviceFingerprintRepository: Send + Sync {
    async fn fetch_device(&self, fingerprint: &str) -> anyhow::Result<Option<DeviceFingerprint>>;
    async fn upsert_device(&self, update: &DeviceFingerprintUpdate) -> anyhow::Result<()>;
}
