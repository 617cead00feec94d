use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] anyhow::Error),
    #[error("full scan failed after {logs_scanned} logs: {source}")]
    ScanFailed {
        logs_scanned: usize,
        #[source]
        source: anyhow::Error,
    },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn store(err: anyhow::Error) -> Self {
        AppError::StoreUnavailable(err)
    }
}

impl From<backend_domain::DomainError> for AppError {
    fn from(err: backend_domain::DomainError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
