use crate::app::ServiceError;
use crate::storage::docs::StoreError;
use crate::transport::http::types::ApiResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

/// `{success: true, data}` with the given status.
pub fn respond<T: Serialize>(status: StatusCode, data: T) -> Response {
    match serde_json::to_value(data) {
        Ok(data) => (
            status,
            Json(ApiResponse {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to serialize response body");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "failed to serialize response".to_string())
        }
    }
}

pub fn failure(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(message),
        }),
    )
        .into_response()
}

pub fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::NotFound { .. } | ServiceError::NoRatings { .. } => StatusCode::NOT_FOUND,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::InvalidRange { .. } | ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        // A racing insert that slipped past the uniqueness check.
        ServiceError::Store(StoreError::Duplicate { .. }) => StatusCode::CONFLICT,
        ServiceError::Store(e) if e.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Store(_) | ServiceError::CorruptDocument(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Maps a service failure onto the response envelope. Client errors are
/// logged at `warn`, server errors at `error`.
pub fn service_error(operation: &str, err: ServiceError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(operation, error = %err, "request failed");
    } else {
        warn!(operation, error = %err, "request rejected");
    }
    failure(status, err.to_string())
}

/// Collapses a service result into a response.
pub fn reply<T: Serialize>(
    operation: &str,
    status: StatusCode,
    result: Result<T, ServiceError>,
) -> Response {
    match result {
        Ok(data) => respond(status, data),
        Err(err) => service_error(operation, err),
    }
}
