use std::collections::HashSet;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clickhouse::Client;
use tracing::warn;

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
};

use super::rows::{
    AnomalyRecordRow,
    AttendanceLogRow,
    DeviceFingerprintRow,
    JoinedAttendanceRow,
    WorkerLocationRow,
    ANOMALY_COLUMNS,
    ATTENDANCE_COLUMNS,
    DEVICE_COLUMNS,
    LOCATION_COLUMNS,
};

// Millisecond parameters are bound as integers and converted server side.
const AT: &str = "fromUnixTimestamp64Milli(toInt64(?))";

#[derive(Clone)]
pub struct ClickhouseRepo {
    client: Client,
    database: String,
}

impl ClickhouseRepo {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    async fn create_tables(&self) -> Result<()> {
        let create_db = format!("CREATE DATABASE IF NOT EXISTS {}", self.database);
        self.client.query(&create_db).execute().await?;

        let create_attendance = r#"
CREATE TABLE IF NOT EXISTS attendance_logs (
    id String,
    worker_id String,
    check_in_time DateTime64(3),
    check_out_time Nullable(Int64),
    latitude Nullable(Float64),
    longitude Nullable(Float64),
    device_fingerprint String,
    ip_address String,
    zone String,
    verification_method LowCardinality(String),
    is_verified Bool
) ENGINE = MergeTree
PARTITION BY toDate(check_in_time)
ORDER BY (check_in_time, worker_id)
"#;
        self.client.query(create_attendance).execute().await?;

        let create_workers = r#"
CREATE TABLE IF NOT EXISTS workers (
    id String,
    employee_id String,
    full_name String,
    zone String
) ENGINE = ReplacingMergeTree
ORDER BY id
"#;
        self.client.query(create_workers).execute().await?;

        let create_locations = r#"
CREATE TABLE IF NOT EXISTS worker_locations (
    id String,
    worker_id String,
    latitude Float64,
    longitude Float64,
    zone Nullable(String),
    accuracy Nullable(Float64),
    recorded_at DateTime64(3)
) ENGINE = MergeTree
PARTITION BY toDate(recorded_at)
ORDER BY (worker_id, recorded_at)
"#;
        self.client.query(create_locations).execute().await?;

        let create_anomalies = r#"
CREATE TABLE IF NOT EXISTS anomalies (
    id String,
    created_at DateTime64(3),
    anomaly_type LowCardinality(String),
    severity LowCardinality(String),
    title String,
    description String,
    worker_ids Array(String),
    attendance_log_ids Array(String),
    zone Nullable(String),
    latitude Nullable(Float64),
    longitude Nullable(Float64),
    metadata_json String,
    dedup_key String,
    is_resolved Bool,
    resolved_at Nullable(Int64),
    resolved_by Nullable(String)
) ENGINE = MergeTree
PARTITION BY toDate(created_at)
ORDER BY (created_at, id)
"#;
        self.client.query(create_anomalies).execute().await?;

        let create_devices = r#"
CREATE TABLE IF NOT EXISTS device_fingerprints (
    fingerprint String,
    total_workers_count UInt32,
    flagged Bool,
    first_seen_at DateTime64(3),
    last_seen_at DateTime64(3)
) ENGINE = ReplacingMergeTree(last_seen_at)
ORDER BY fingerprint
"#;
        self.client.query(create_devices).execute().await?;
        Ok(())
    }
}

#[async_trait]
impl AttendanceRepository for ClickhouseRepo {
    async fn ensure_schema(&self) -> Result<()> {
        self.create_tables().await
    }

    async fn insert_attendance(&self, record: &AttendanceRecord) -> Result<()> {
        let mut insert = self.client.insert("attendance_logs")?;
        insert.write(&AttendanceLogRow::from(record)).await?;
        insert.end().await?;
        Ok(())
    }

    async fn fetch_check_ins_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_worker: &str,
    ) -> Result<Vec<AttendanceRecord>> {
        let query = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance_logs \
             WHERE check_in_time >= {AT} AND check_in_time <= {AT} AND worker_id != ? \
             ORDER BY check_in_time ASC"
        );
        let rows = self
            .client
            .query(&query)
            .bind(start.timestamp_millis())
            .bind(end.timestamp_millis())
            .bind(exclude_worker)
            .fetch_all::<AttendanceLogRow>()
            .await?;
        Ok(rows.into_iter().map(AttendanceRecord::from).collect())
    }

    async fn fetch_device_workers(&self, fingerprint: &str, exclude_worker: &str) -> Result<Vec<String>> {
        let rows = self
            .client
            .query(
                "SELECT DISTINCT worker_id FROM attendance_logs \
                 WHERE device_fingerprint = ? AND worker_id != ? ORDER BY worker_id",
            )
            .bind(fingerprint)
            .bind(exclude_worker)
            .fetch_all::<String>()
            .await?;
        Ok(rows)
    }

    async fn fetch_day_check_ins(&self, window: &DayWindow) -> Result<Vec<AttendanceRecord>> {
        let columns = ATTENDANCE_COLUMNS
            .split(", ")
            .map(|column| format!("a.{}", column))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "SELECT {columns}, w.employee_id, w.full_name \
             FROM attendance_logs AS a \
             LEFT JOIN (SELECT id, employee_id, full_name FROM workers FINAL) AS w ON w.id = a.worker_id \
             WHERE a.check_in_time >= {AT} AND a.check_in_time < {AT} \
             ORDER BY a.check_in_time ASC"
        );
        let rows = self
            .client
            .query(&query)
            .bind(window.start.timestamp_millis())
            .bind(window.end.timestamp_millis())
            .fetch_all::<JoinedAttendanceRow>()
            .await?;
        Ok(rows.into_iter().map(AttendanceRecord::from).collect())
    }

    async fn ping(&self) -> Result<()> {
        let _: u8 = self.client.query("SELECT toUInt8(1)").fetch_one().await?;
        Ok(())
    }
}

#[async_trait]
impl WorkerLocationRepository for ClickhouseRepo {
    async fn insert_location(&self, location: &WorkerLocation) -> Result<()> {
        let mut insert = self.client.insert("worker_locations")?;
        insert.write(&WorkerLocationRow::from(location)).await?;
        insert.end().await?;
        Ok(())
    }

    async fn fetch_last_location(
        &self,
        worker_id: &str,
        since: DateTime<Utc>,
        before: DateTime<Utc>,
    ) -> Result<Option<WorkerLocation>> {
        let query = format!(
            "SELECT {LOCATION_COLUMNS} FROM worker_locations \
             WHERE worker_id = ? AND recorded_at >= {AT} AND recorded_at < {AT} \
             ORDER BY recorded_at DESC LIMIT 1"
        );
        let rows = self
            .client
            .query(&query)
            .bind(worker_id)
            .bind(since.timestamp_millis())
            .bind(before.timestamp_millis())
            .fetch_all::<WorkerLocationRow>()
            .await?;
        Ok(rows.into_iter().next().map(WorkerLocation::from))
    }
}

#[async_trait]
impl AnomalyRepository for ClickhouseRepo {
    async fn insert_anomalies(&self, anomalies: &[Anomaly]) -> Result<()> {
        let mut insert = self.client.insert("anomalies")?;
        for anomaly in anomalies {
            insert.write(&AnomalyRecordRow::try_from(anomaly)?).await?;
        }
        insert.end().await?;
        Ok(())
    }

    async fn fetch_anomalies(&self, filter: &AnomalyFilter) -> Result<Vec<Anomaly>> {
        let mut query = format!(
            "SELECT {ANOMALY_COLUMNS} FROM anomalies WHERE created_at >= {AT} AND created_at < {AT}"
        );
        if filter.anomaly_type.is_some() {
            query.push_str(" AND anomaly_type = ?");
        }
        if filter.resolved.is_some() {
            query.push_str(" AND is_resolved = ?");
        }
        query.push_str(&format!(" ORDER BY created_at DESC LIMIT {}", filter.limit));

        let mut request = self
            .client
            .query(&query)
            .bind(filter.window.start.timestamp_millis())
            .bind(filter.window.end.timestamp_millis());
        if let Some(anomaly_type) = filter.anomaly_type {
            request = request.bind(anomaly_type.as_str());
        }
        if let Some(resolved) = filter.resolved {
            request = request.bind(resolved);
        }
        let rows = request.fetch_all::<AnomalyRecordRow>().await?;

        let mut anomalies = Vec::with_capacity(rows.len());
        for row in rows {
            match Anomaly::try_from(row) {
                Ok(anomaly) => anomalies.push(anomaly),
                Err(err) => warn!("skipping unreadable anomaly row: {}", err),
            }
        }
        Ok(anomalies)
    }

    async fn fetch_type_severity_counts(&self, window: &DayWindow) -> Result<Vec<AnomalyCount>> {
        let query = format!(
            "SELECT anomaly_type, severity, count() AS cnt FROM anomalies \
             WHERE created_at >= {AT} AND created_at < {AT} \
             GROUP BY anomaly_type, severity"
        );
        let rows = self
            .client
            .query(&query)
            .bind(window.start.timestamp_millis())
            .bind(window.end.timestamp_millis())
            .fetch_all::<(String, String, u64)>()
            .await?;

        let mut counts = Vec::with_capacity(rows.len());
        for (anomaly_type, severity, count) in rows {
            match (anomaly_type.parse(), severity.parse()) {
                (Ok(anomaly_type), Ok(severity)) => counts.push(AnomalyCount {
                    anomaly_type,
                    severity,
                    count,
                }),
                _ => warn!("ignoring unknown anomaly bucket {}/{}", anomaly_type, severity),
            }
        }
        Ok(counts)
    }

    async fn fetch_dedup_keys(&self, window: &DayWindow) -> Result<HashSet<String>> {
        let query = format!(
            "SELECT DISTINCT dedup_key FROM anomalies WHERE created_at >= {AT} AND dedup_key != ''"
        );
        let rows = self
            .client
            .query(&query)
            .bind(window.start.timestamp_millis())
            .fetch_all::<String>()
            .await?;
        Ok(rows.into_iter().collect())
    }

    async fn anomaly_exists(&self, id: &str) -> Result<bool> {
        let count: u64 = self
            .client
            .query("SELECT count() FROM anomalies WHERE id = ?")
            .bind(id)
            .fetch_one()
            .await?;
        Ok(count > 0)
    }

    async fn resolve_anomaly(&self, id: &str, resolved_by: &str, resolved_at: DateTime<Utc>) -> Result<bool> {
        let pending: u64 = self
            .client
            .query("SELECT count() FROM anomalies WHERE id = ? AND is_resolved = false")
            .bind(id)
            .fetch_one()
            .await?;
        if pending == 0 {
            return Ok(false);
        }
        self.client
            .query(
                "ALTER TABLE anomalies UPDATE is_resolved = true, resolved_at = ?, resolved_by = ? \
                 WHERE id = ? AND is_resolved = false SETTINGS mutations_sync = 1",
            )
            .bind(resolved_at.timestamp_millis())
            .bind(resolved_by)
            .bind(id)
            .execute()
            .await?;
        Ok(true)
    }

    async fn ping(&self) -> Result<()> {
        let present: u8 = self.client.query("EXISTS TABLE anomalies").fetch_one().await?;
        if present == 0 {
            bail!("anomalies table is missing");
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceFingerprintRepository for ClickhouseRepo {
    async fn fetch_device(&self, fingerprint: &str) -> Result<Option<DeviceFingerprint>> {
        let query = format!(
            "SELECT {DEVICE_COLUMNS} FROM device_fingerprints FINAL WHERE fingerprint = ? LIMIT 1"
        );
        let rows = self
            .client
            .query(&query)
            .bind(fingerprint)
            .fetch_all::<DeviceFingerprintRow>()
            .await?;
        Ok(rows.into_iter().next().map(DeviceFingerprint::from))
    }

    async fn upsert_device(&self, update: &DeviceFingerprintUpdate) -> Result<()> {
        // ReplacingMergeTree keeps the newest row; carry first_seen_at forward by hand
        let existing = self.fetch_device(&update.fingerprint).await?;
        let merged = DeviceFingerprint::merged(existing.as_ref(), update);
        let mut insert = self.client.insert("device_fingerprints")?;
        insert.write(&DeviceFingerprintRow::from(&merged)).await?;
        insert.end().await?;
        Ok(())
    }
}
