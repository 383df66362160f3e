//! API error types with HTTP response mapping (spec §6, §7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::OrderError;
use repository::RepositoryError;
use saga::SagaError;

/// API-level error type that maps to the HTTP status codes spec.md §6
/// specifies: 404 not found, 409 admission violation, 422 empty order.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    AdmissionViolation(String),
    EmptyOrder,
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::AdmissionViolation(msg) => (StatusCode::CONFLICT, msg),
            ApiError::EmptyOrder => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "order must contain at least one piece".to_string(),
            ),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::OrderNotFound(id) => ApiError::NotFound(format!("order {id} not found")),
            RepositoryError::SagaNotFound(id) => ApiError::NotFound(format!("cancellation saga {id} not found")),
            RepositoryError::InvalidOrder(OrderError::EmptyOrder) => ApiError::EmptyOrder,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::EmptyOrder => ApiError::EmptyOrder,
        }
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        match err {
            SagaError::AdmissionViolation(id) => {
                ApiError::AdmissionViolation(format!("order {id} not eligible for cancellation in its current state"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}
