use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::validation::ValidationErrors;
use crate::relay::RelayError;
use crate::render::pdf::BuildError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Brochure build failed: {0}")]
    Build(#[from] BuildError),

    #[error("Messaging relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("Messaging relay is not configured")]
    RelayNotConfigured,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// `Json` extractor whose rejections use the `AppError` envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors.messages())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details): (StatusCode, &str, String, Option<Value>) =
            match &self {
                AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
                AppError::Validation(messages) => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    "Validation error".to_string(),
                    Some(json!(messages)),
                ),
                AppError::BadRequest(msg) => {
                    (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
                }
                AppError::Build(e) => {
                    tracing::error!("Brochure build error: {e}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "BUILD_ERROR",
                        "Failed to generate PDF".to_string(),
                        None,
                    )
                }
                AppError::Relay(e) => {
                    tracing::error!("Messaging relay error: {e}");
                    (
                        StatusCode::BAD_GATEWAY,
                        "RELAY_ERROR",
                        "Failed to send PDF via WhatsApp".to_string(),
                        None,
                    )
                }
                AppError::RelayNotConfigured => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "RELAY_NOT_CONFIGURED",
                    "WhatsApp delivery is not configured on this server".to_string(),
                    None,
                ),
                AppError::Internal(e) => {
                    tracing::error!("Internal error: {e:?}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal server error occurred".to_string(),
                        None,
                    )
                }
            };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
