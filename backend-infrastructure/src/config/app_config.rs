use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use backend_domain::entities::detection_rules::{
    BUDDY_PUNCH_RADIUS_METERS,
    BUDDY_PUNCH_WINDOW_SECONDS,
    MAX_TRAVEL_SPEED_KMH,
    SHARED_DEVICE_CRITICAL_WORKERS,
    SHARED_DEVICE_MIN_WORKERS,
    TRAVEL_FLOOR_KM,
    TRAVEL_LOOKBACK_MINUTES,
};
use backend_domain::{DbConfig, DetectionThresholds, RuntimeConfig, StorageBackend};

use super::validation::{validate_schedule, validate_thresholds};

pub const CONFIG_ENV: &str = "GHOSTWATCH_CONFIG";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub storage_backend: StorageBackend,
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
    pub buddy_window_seconds: i64,
    pub buddy_radius_meters: f64,
    pub max_travel_speed_kmh: f64,
    pub travel_floor_km: f64,
    pub travel_lookback_minutes: i64,
    pub shared_device_min_workers: usize,
    pub shared_device_critical_workers: usize,
    pub full_scan_enabled: bool,
    /// Runs before noon scan the previous day; later runs scan the current day
    /// and miss check-ins between the run and midnight.
    pub full_scan_hour: u32,
    pub full_scan_minute: u32,
    pub full_scan_dedup: bool,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let runtime = RuntimeConfig::default();
        Self {
            bind_addr: runtime.bind_addr,
            api_token: None,
            storage_backend: StorageBackend::Clickhouse,
            clickhouse_url: "http://127.0.0.1:8123".to_string(),
            clickhouse_database: "ghostwatch".to_string(),
            clickhouse_user: None,
            clickhouse_password: None,
            buddy_window_seconds: BUDDY_PUNCH_WINDOW_SECONDS,
            buddy_radius_meters: BUDDY_PUNCH_RADIUS_METERS,
            max_travel_speed_kmh: MAX_TRAVEL_SPEED_KMH,
            travel_floor_km: TRAVEL_FLOOR_KM,
            travel_lookback_minutes: TRAVEL_LOOKBACK_MINUTES,
            shared_device_min_workers: SHARED_DEVICE_MIN_WORKERS,
            shared_device_critical_workers: SHARED_DEVICE_CRITICAL_WORKERS,
            full_scan_enabled: runtime.full_scan_enabled,
            full_scan_hour: runtime.full_scan_hour,
            full_scan_minute: runtime.full_scan_minute,
            full_scan_dedup: runtime.full_scan_dedup,
            max_body_bytes: runtime.max_body_bytes,
            request_timeout_seconds: runtime.request_timeout_seconds,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var(CONFIG_ENV).unwrap_or_else(|_| "./config.toml".to_string());
        let file_path = Path::new(&path);
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            Self::from_toml(&content)?
        } else {
            warn!("{} not found, using defaults", path);
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| anyhow!("invalid config: {}", err))
    }

    pub fn normalize(&mut self) {
        self.api_token = blank_to_none(self.api_token.take());
        self.clickhouse_user = blank_to_none(self.clickhouse_user.take());
        self.clickhouse_password = blank_to_none(self.clickhouse_password.take());
        self.clickhouse_url = self.clickhouse_url.trim().to_string();
        self.clickhouse_database = self.clickhouse_database.trim().to_string();
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow!("request_timeout_seconds must be greater than 0"));
        }
        if self.storage_backend == StorageBackend::Clickhouse {
            if self.clickhouse_url.is_empty() {
                return Err(anyhow!("clickhouse_url must not be empty"));
            }
            if self.clickhouse_database.is_empty()
                || !self
                    .clickhouse_database
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(anyhow!(
                    "clickhouse_database must be a plain identifier, got '{}'",
                    self.clickhouse_database
                ));
            }
        }
        validate_thresholds(&self.thresholds())?;
        validate_schedule(self.full_scan_hour, self.full_scan_minute)?;
        Ok(())
    }

    pub fn thresholds(&self) -> DetectionThresholds {
        DetectionThresholds {
            buddy_window_seconds: self.buddy_window_seconds,
            buddy_radius_meters: self.buddy_radius_meters,
            max_travel_speed_kmh: self.max_travel_speed_kmh,
            travel_floor_km: self.travel_floor_km,
            travel_lookback_minutes: self.travel_lookback_minutes,
            shared_device_min_workers: self.shared_device_min_workers,
            shared_device_critical_workers: self.shared_device_critical_workers,
        }
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            thresholds: self.thresholds(),
            full_scan_enabled: self.full_scan_enabled,
            full_scan_hour: self.full_scan_hour,
            full_scan_minute: self.full_scan_minute,
            full_scan_dedup: self.full_scan_dedup,
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            storage_backend: self.storage_backend,
            clickhouse_url: self.clickhouse_url.clone(),
            clickhouse_database: self.clickhouse_database.clone(),
            clickhouse_user: self.clickhouse_user.clone(),
            clickhouse_password: self.clickhouse_password.clone(),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("GHOSTWATCH_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("GHOSTWATCH_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("GHOSTWATCH_STORAGE_BACKEND") {
            match value.trim().to_ascii_lowercase().as_str() {
                "clickhouse" => self.storage_backend = StorageBackend::Clickhouse,
                "memory" => self.storage_backend = StorageBackend::Memory,
                other => warn!("ignoring unknown GHOSTWATCH_STORAGE_BACKEND '{}'", other),
            }
        }
        if let Ok(value) = env::var("GHOSTWATCH_CLICKHOUSE_URL") {
            self.clickhouse_url = value;
        }
        if let Ok(value) = env::var("GHOSTWATCH_CLICKHOUSE_DATABASE") {
            self.clickhouse_database = value;
        }
        if let Ok(value) = env::var("GHOSTWATCH_CLICKHOUSE_USER") {
            self.clickhouse_user = Some(value);
        }
        if let Ok(value) = env::var("GHOSTWATCH_CLICKHOUSE_PASSWORD") {
            self.clickhouse_password = Some(value);
        }
        if let Ok(value) = env::var("GHOSTWATCH_BUDDY_WINDOW_SECONDS") {
            self.buddy_window_seconds = value.parse().unwrap_or(self.buddy_window_seconds);
        }
        if let Ok(value) = env::var("GHOSTWATCH_BUDDY_RADIUS_METERS") {
            self.buddy_radius_meters = value.parse().unwrap_or(self.buddy_radius_meters);
        }
        if let Ok(value) = env::var("GHOSTWATCH_MAX_TRAVEL_SPEED_KMH") {
            self.max_travel_speed_kmh = value.parse().unwrap_or(self.max_travel_speed_kmh);
        }
        if let Ok(value) = env::var("GHOSTWATCH_TRAVEL_FLOOR_KM") {
            self.travel_floor_km = value.parse().unwrap_or(self.travel_floor_km);
        }
        if let Ok(value) = env::var("GHOSTWATCH_TRAVEL_LOOKBACK_MINUTES") {
            self.travel_lookback_minutes = value.parse().unwrap_or(self.travel_lookback_minutes);
        }
        if let Ok(value) = env::var("GHOSTWATCH_SHARED_DEVICE_MIN_WORKERS") {
            self.shared_device_min_workers = value.parse().unwrap_or(self.shared_device_min_workers);
        }
        if let Ok(value) = env::var("GHOSTWATCH_SHARED_DEVICE_CRITICAL_WORKERS") {
            self.shared_device_critical_workers =
                value.parse().unwrap_or(self.shared_device_critical_workers);
        }
        if let Ok(value) = env::var("GHOSTWATCH_FULL_SCAN_ENABLED") {
            self.full_scan_enabled = value.parse().unwrap_or(self.full_scan_enabled);
        }
        if let Ok(value) = env::var("GHOSTWATCH_FULL_SCAN_HOUR") {
            self.full_scan_hour = value.parse().unwrap_or(self.full_scan_hour);
        }
        if let Ok(value) = env::var("GHOSTWATCH_FULL_SCAN_MINUTE") {
            self.full_scan_minute = value.parse().unwrap_or(self.full_scan_minute);
        }
        if let Ok(value) = env::var("GHOSTWATCH_FULL_SCAN_DEDUP") {
            self.full_scan_dedup = value.parse().unwrap_or(self.full_scan_dedup);
        }
        if let Ok(value) = env::var("GHOSTWATCH_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("GHOSTWATCH_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|inner| !inner.trim().is_empty())
}
