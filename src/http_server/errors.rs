//! HTTP error bodies
//!
//! Every failed request answers `{"error": ..., "code": ...}` with the
//! status derived from the registry error kind.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::registry::RegistryError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

/// Errors returned by route handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        let code = match self {
            ApiError::Registry(e) => e.status_code(),
            ApiError::BadRequest(_) => 400,
            ApiError::Internal(_) => 500,
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Level;

    #[test]
    fn test_status_mapping() {
        let not_found: ApiError = RegistryError::not_found(Level::Module, "acme/net").into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let unavailable: ApiError = RegistryError::StorageUnavailable("down".into()).into();
        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        assert_eq!(
            ApiError::bad_request("missing file").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_response_status() {
        let err: ApiError = RegistryError::VersionAlreadyExists("a/b/c/1.0.0".into()).into();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }
}
