use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use tracing::error;

use backend_application::commands::check_in_commands;
use backend_application::AppState;
use backend_domain::CheckInResponse;

use crate::error::HttpError;
use crate::middleware::{authorize, parse_check_in};

pub async fn record_check_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<(StatusCode, Json<CheckInResponse>), HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }

    let request = parse_check_in(&headers, &body).map_err(|err| {
        error!("failed to parse check-in body: {}", err);
        HttpError::BadRequest(err.to_string())
    })?;

    let response = check_in_commands::record_check_in(&state, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
