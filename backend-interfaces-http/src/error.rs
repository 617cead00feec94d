use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use backend_application::AppError;

#[derive(Debug)]
pub enum HttpError {
    Unauthorized,
    BadRequest(String),
    NotFound(String),
    Unavailable {
        message: String,
        logs_scanned: Option<usize>,
    },
    Internal(String),
}

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        match value {
            AppError::Unauthorized => HttpError::Unauthorized,
            AppError::BadRequest(msg) => HttpError::BadRequest(msg),
            AppError::NotFound(msg) => HttpError::NotFound(msg),
            AppError::StoreUnavailable(err) => HttpError::Unavailable {
                message: format!("store unavailable: {}", err),
                logs_scanned: None,
            },
            AppError::ScanFailed {
                logs_scanned,
                source,
            } => HttpError::Unavailable {
                message: format!("full scan failed: {}", source),
                logs_scanned: Some(logs_scanned),
            },
            AppError::Internal(err) => HttpError::Internal(err.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    logs_scanned: Option<usize>,
}

impl HttpError {
    fn status(&self) -> StatusCode {
        match self {
            HttpError::Unauthorized => StatusCode::UNAUTHORIZED,
            HttpError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            HttpError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            HttpError::Unauthorized => ErrorBody {
                error: "unauthorized".to_string(),
                logs_scanned: None,
            },
            HttpError::BadRequest(msg) => ErrorBody {
                error: format!("bad request: {}", msg),
                logs_scanned: None,
            },
            HttpError::NotFound(msg) => ErrorBody {
                error: format!("not found: {}", msg),
                logs_scanned: None,
            },
            HttpError::Unavailable {
                message,
                logs_scanned,
            } => ErrorBody {
                error: message,
                logs_scanned,
            },
            HttpError::Internal(msg) => ErrorBody {
                error: msg,
                logs_scanned: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
