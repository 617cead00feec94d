use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;
use tracing::error;

use crate::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub store: &'static str,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Readiness {
    pub ready: bool,
    pub stores: Vec<StoreStatus>,
}

/// Pings the attendance store the check-in path reads and the anomaly store
/// the scanner writes. Ready only when both answer within `limit`.
pub async fn check_readiness(state: &AppState, limit: Duration) -> Readiness {
    let (attendance, anomalies) = tokio::join!(
        probe("attendance", limit, state.attendance_repo.ping()),
        probe("anomalies", limit, state.anomaly_repo.ping()),
    );
    let stores = vec![attendance, anomalies];
    Readiness {
        ready: stores.iter().all(|status| status.ready),
        stores,
    }
}

async fn probe<F>(store: &'static str, limit: Duration, ping: F) -> StoreStatus
where
    F: Future<Output = anyhow::Result<()>>,
{
    let failure = match timeout(limit, ping).await {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(err.to_string()),
        Err(_) => Some(format!("no answer within {}s", limit.as_secs())),
    };
    if let Some(reason) = &failure {
        error!("{} store not ready: {}", store, reason);
    }
    StoreStatus {
        store,
        ready: failure.is_none(),
        error: failure,
    }
}
