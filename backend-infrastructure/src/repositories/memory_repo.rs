use std::collections::{HashMap, HashSet};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use backend_domain::ports::{
    AnomalyRepository,
    AttendanceRepository,
    DeviceFingerprintRepository,
    WorkerLocationRepository,
};
use backend_domain::utils::DayWindow;
use backend_domain::{
    Anomaly,
    AnomalyCount,
    AnomalyFilter,
    AttendanceRecord,
    DeviceFingerprint,
    DeviceFingerprintUpdate,
    WorkerLocation,
    WorkerProfile,
};

/// Process-local store backing every repository port.
#[derive(Default)]
pub struct InMemoryRepo {
    attendance: RwLock<Vec<AttendanceRecord>>,
    workers: RwLock<HashMap<String, WorkerProfile>>,
    locations: RwLock<Vec<WorkerLocation>>,
    anomalies: RwLock<Vec<Anomaly>>,
    devices: RwLock<HashMap<String, DeviceFingerprint>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_worker(&self, worker_id: &str, profile: WorkerProfile) {
        self.workers
            .write()
            .await
            .insert(worker_id.to_string(), profile);
    }

    pub async fn anomalies(&self) -> Vec<Anomaly> {
        self.anomalies.read().await.clone()
    }

    pub async fn locations(&self) -> Vec<WorkerLocation> {
        self.locations.read().await.clone()
    }
}

#[async_trait]
impl AttendanceRepository for InMemoryRepo {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_attendance(&self, record: &AttendanceRecord) -> Result<()> {
        self.attendance.write().await.push(record.clone());
        Ok(())
    }

    async fn fetch_check_ins_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_worker: &str,
    ) -> Result<Vec<AttendanceRecord>> {
        let mut rows = self
            .attendance
            .read()
            .await
            .iter()
            .filter(|record| record.worker_id != exclude_worker)
            .filter(|record| record.check_in_time >= start && record.check_in_time <= end)
            .cloned()
            .collect::<Vec<_>>();
        rows.sort_by_key(|record| record.check_in_time);
        Ok(rows)
    }

    async fn fetch_device_workers(&self, fingerprint: &str, exclude_worker: &str) -> Result<Vec<String>> {
        let mut workers = self
            .attendance
            .read()
            .await
            .iter()
            .filter(|record| record.fingerprint() == Some(fingerprint))
            .filter(|record| record.worker_id != exclude_worker)
            .map(|record| record.worker_id.clone())
            .collect::<Vec<_>>();
        workers.sort();
        workers.dedup();
        Ok(workers)
    }

    async fn fetch_day_check_ins(&self, window: &DayWindow) -> Result<Vec<AttendanceRecord>> {
        let workers = self.workers.read().await;
        let mut rows = self
            .attendance
            .read()
            .await
            .iter()
            .filter(|record| window.contains(record.check_in_time))
            .cloned()
            .map(|mut record| {
                record.worker = workers.get(&record.worker_id).cloned();
                record
            })
            .collect::<Vec<_>>();
        rows.sort_by_key(|record| record.check_in_time);
        Ok(rows)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl WorkerLocationRepository for InMemoryRepo {
    async fn insert_location(&self, location: &WorkerLocation) -> Result<()> {
        self.locations.write().await.push(location.clone());
        Ok(())
    }

    async fn fetch_last_location(
        &self,
        worker_id: &str,
        since: DateTime<Utc>,
        before: DateTime<Utc>,
    ) -> Result<Option<WorkerLocation>> {
        let latest = self
            .locations
            .read()
            .await
            .iter()
            .filter(|location| location.worker_id == worker_id)
            .filter(|location| location.recorded_at >= since && location.recorded_at < before)
            .max_by_key(|location| location.recorded_at)
            .cloned();
        Ok(latest)
    }
}

#[async_trait]
impl AnomalyRepository for InMemoryRepo {
    async fn insert_anomalies(&self, anomalies: &[Anomaly]) -> Result<()> {
        self.anomalies.write().await.extend_from_slice(anomalies);
        Ok(())
    }

    async fn fetch_anomalies(&self, filter: &AnomalyFilter) -> Result<Vec<Anomaly>> {
        let mut rows = self
            .anomalies
            .read()
            .await
            .iter()
            .filter(|anomaly| filter.window.contains(anomaly.created_at))
            .filter(|anomaly| {
                filter
                    .anomaly_type
                    .map_or(true, |anomaly_type| anomaly.anomaly_type == anomaly_type)
            })
            .filter(|anomaly| filter.resolved.map_or(true, |resolved| anomaly.is_resolved == resolved))
            .cloned()
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(filter.limit);
        Ok(rows)
    }

    async fn fetch_type_severity_counts(&self, window: &DayWindow) -> Result<Vec<AnomalyCount>> {
        let mut buckets: HashMap<_, u64> = HashMap::new();
        for anomaly in self.anomalies.read().await.iter() {
            if window.contains(anomaly.created_at) {
                *buckets
                    .entry((anomaly.anomaly_type, anomaly.severity))
                    .or_default() += 1;
            }
        }
        Ok(buckets
            .into_iter()
            .map(|((anomaly_type, severity), count)| AnomalyCount {
                anomaly_type,
                severity,
                count,
            })
            .collect())
    }

    async fn fetch_dedup_keys(&self, window: &DayWindow) -> Result<HashSet<String>> {
        Ok(self
            .anomalies
            .read()
            .await
            .iter()
            .filter(|anomaly| anomaly.created_at >= window.start && !anomaly.dedup_key.is_empty())
            .map(|anomaly| anomaly.dedup_key.clone())
            .collect())
    }

    async fn anomaly_exists(&self, id: &str) -> Result<bool> {
        Ok(self.anomalies.read().await.iter().any(|anomaly| anomaly.id == id))
    }

    async fn resolve_anomaly(&self, id: &str, resolved_by: &str, resolved_at: DateTime<Utc>) -> Result<bool> {
        let mut anomalies = self.anomalies.write().await;
        Ok(anomalies
            .iter_mut()
            .find(|anomaly| anomaly.id == id)
            .map_or(false, |anomaly| anomaly.resolve(resolved_by, resolved_at)))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl DeviceFingerprintRepository for InMemoryRepo {
    async fn fetch_device(&self, fingerprint: &str) -> Result<Option<DeviceFingerprint>> {
        Ok(self.devices.read().await.get(fingerprint).cloned())
    }

    async fn upsert_device(&self, update: &DeviceFingerprintUpdate) -> Result<()> {
        let mut devices = self.devices.write().await;
        let merged = DeviceFingerprint::merged(devices.get(&update.fingerprint), update);
        devices.insert(update.fingerprint.clone(), merged);
        Ok(())
    }
}
