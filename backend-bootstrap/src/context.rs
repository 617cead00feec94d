use std::sync::Arc;

use anyhow::Result;
use clickhouse::Client;
use tracing::{info, warn};

use backend_application::{AppState, Metrics};
use backend_domain::ports::{
    AnomalyRepository,
    AttendanceRepository,
    DeviceFingerprintRepository,
    WorkerLocationRepository,
};
use backend_domain::{DbConfig, RuntimeConfig, StorageBackend};
use backend_infrastructure::{AppConfig, ClickhouseRepo, InMemoryRepo};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new() -> Result<Self> {
        let config = AppConfig::load().await?;
        let runtime_config = config.to_runtime_config();
        let db_config = config.to_db_config();

        let state = match db_config.storage_backend {
            StorageBackend::Clickhouse => {
                let repo = Arc::new(connect_clickhouse(&db_config));
                repo.ensure_schema().await?;
                info!(
                    url = %db_config.clickhouse_url,
                    database = %db_config.clickhouse_database,
                    "clickhouse storage ready"
                );
                wire(runtime_config, repo)
            }
            StorageBackend::Memory => {
                warn!("memory storage selected, nothing survives a restart");
                wire(runtime_config, Arc::new(InMemoryRepo::new()))
            }
        };

        Ok(Self { state })
    }
}

fn connect_clickhouse(db_config: &DbConfig) -> ClickhouseRepo {
    let mut clickhouse = Client::default()
        .with_url(&db_config.clickhouse_url)
        .with_database(&db_config.clickhouse_database);
    if let Some(user) = &db_config.clickhouse_user {
        clickhouse = clickhouse.with_user(user);
    }
    if let Some(password) = &db_config.clickhouse_password {
        clickhouse = clickhouse.with_password(password);
    }
    ClickhouseRepo::new(clickhouse, db_config.clickhouse_database.clone())
}

/// One store behind all four ports.
fn wire<R>(config: RuntimeConfig, repo: Arc<R>) -> AppState
where
    R: AttendanceRepository
        + WorkerLocationRepository
        + AnomalyRepository
        + DeviceFingerprintRepository
        + 'static,
{
    AppState {
        config,
        attendance_repo: repo.clone(),
        location_repo: repo.clone(),
        anomaly_repo: repo.clone(),
        device_repo: repo,
        metrics: Arc::new(Metrics::default()),
    }
}
