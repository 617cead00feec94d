// Backend Application Layer

pub mod commands;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod queries;
pub mod state;

pub use dispatch::{dispatch, GhostDetectionRequest, GhostDetectionResponse};
pub use error::AppError;
pub use metrics::Metrics;
pub use state::AppState;
