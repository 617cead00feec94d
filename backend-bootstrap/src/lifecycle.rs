use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use backend_application::AppState;
use backend_domain::RuntimeConfig;
use backend_infrastructure::schedule_full_scans;
use backend_interfaces_http::build_router;

use crate::context::AppContext;

/// Check-in payloads are small; the body limit mostly guards the gzip path.
fn with_service_layers(router: Router, config: &RuntimeConfig) -> Router {
    let body_limit = usize::try_from(config.max_body_bytes).unwrap_or(usize::MAX);
    router
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_seconds)))
        .layer(TraceLayer::new_for_http())
}

fn spawn_scanner(state: &AppState) -> Option<JoinHandle<()>> {
    if !state.config.full_scan_enabled {
        info!("daily full scan disabled");
        return None;
    }
    info!(
        hour = state.config.full_scan_hour,
        minute = state.config.full_scan_minute,
        dedup = state.config.full_scan_dedup,
        "daily full scan scheduled"
    );
    Some(tokio::spawn(schedule_full_scans(state.clone())))
}

pub async fn run_standalone() -> Result<()> {
    let state = AppContext::new().await?.state;
    let addr: SocketAddr = state
        .config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind_addr {}", state.config.bind_addr))?;

    let scanner = spawn_scanner(&state);
    let app = with_service_layers(build_router(state.clone()), &state.config);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {}", addr))?;
    info!("ghostwatch listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let signal = shutdown_signal().await;
            info!("{} received, draining connections", signal);
        })
        .await?;

    if let Some(scanner) = scanner {
        scanner.abort();
    }
    info!("shut down cleanly");
    Ok(())
}

/// Resolves with the name of the first termination signal seen.
async fn shutdown_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                return tokio::select! {
                    _ = tokio::signal::ctrl_c() => "SIGINT",
                    _ = sigterm.recv() => "SIGTERM",
                };
            }
            Err(err) => warn!("sigterm handler unavailable: {}", err),
        }
    }

    let _ = tokio::signal::ctrl_c().await;
    "SIGINT"
}
