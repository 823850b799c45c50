use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Request-level error taxonomy. Every failure a handler can surface is one
/// of these variants; nothing below the handlers panics or escapes untyped.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No image file uploaded")]
    NoImageProvided,

    #[error("Could not open or find the image: {0}")]
    InvalidImage(String),

    #[error("No barcode found in the image")]
    NoBarcodeDetected,

    #[error("No barcodes to look up")]
    NoBarcodes,

    #[error("Nutrition data not found for this product")]
    NotFound,

    #[error("Failed to fetch data: {0}")]
    UpstreamError(String),

    #[error("Product data format is incorrect or nutriments are missing: {0}")]
    MalformedUpstreamData(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NoImageProvided | ApiError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            ApiError::NoBarcodeDetected | ApiError::NoBarcodes | ApiError::NotFound => {
                StatusCode::NOT_FOUND
            }
            ApiError::UpstreamError(_)
            | ApiError::MalformedUpstreamData(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
