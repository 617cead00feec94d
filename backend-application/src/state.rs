use std::sync::Arc;

use backend_domain::ports::{
    AnomalyRepository,
    AttendanceRepository,
    DeviceFingerprintRepository,
    WorkerLocationRepository,
};
use backend_domain::RuntimeConfig;

use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub attendance_repo: Arc<dyn AttendanceRepository>,
    pub location_repo: Arc<dyn WorkerLocationRepository>,
    pub anomaly_repo: Arc<dyn AnomalyRepository>,
    pub device_repo: Arc<dyn DeviceFingerprintRepository>,
    pub metrics: Arc<Metrics>,
}
