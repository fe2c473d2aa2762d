//! Shared API types
//!
//! Every error leaving the server uses the same `{ success, message }`
//! envelope, whether it came from the auth gate or a generic failure.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// JSON error envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Generic API error for everything outside the auth gate
#[derive(Debug)]
pub enum ApiError {
    NotFound { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Internal error; `detail` is logged and never sent to the client
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            message: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound { message } => (StatusCode::NOT_FOUND, message),
            Self::Internal { message } => {
                tracing::error!(detail = %message, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_of(resp: Response) -> ErrorBody {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_internal_hides_detail() {
        let resp = ApiError::internal("db password rejected").into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(resp).await;
        assert!(!body.success);
        assert_eq!(body.message, "Internal server error");
    }

    #[tokio::test]
    async fn test_not_found() {
        let resp = ApiError::not_found("Route not found").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(resp).await, ErrorBody::new("Route not found"));
    }

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(ErrorBody::new("nope")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": false, "message": "nope" }));
    }
}
