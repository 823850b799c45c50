use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{instrument, warn};

use crate::barcode::DecodeError;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

use super::dto::{AggregateOutcome, CanonicalNutritionRecord, LookupOutcome, ScanResponse};
use super::services::{aggregate, resolve};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/barcode", post(scan_barcode_image))
        .route("/nutrition/usda/:code", get(get_usda_nutrition))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

/// GET /nutrition/usda/:code, direct lookup with no image involved.
#[instrument(skip(state))]
pub async fn get_usda_nutrition(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<CanonicalNutritionRecord>> {
    let outcome = resolve(state.products.as_ref(), &code).await;
    single_outcome(outcome).map(Json)
}

/// POST /barcode, multipart upload with field `image`. Decodes every barcode in
/// the image and returns the combined nutrition response.
#[instrument(skip(state, multipart))]
pub async fn scan_barcode_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<ScanResponse>> {
    let image = read_image_field(multipart).await?;

    let codes = state
        .decoder
        .decode_barcodes(&image)
        .map_err(|e| match e {
            DecodeError::InvalidImage(message) => {
                warn!(error = %message, "image payload not decodable");
                ApiError::InvalidImage(message)
            }
        })?;

    if codes.is_empty() {
        return Err(ApiError::NoBarcodeDetected);
    }

    match aggregate(state.products.as_ref(), codes).await? {
        AggregateOutcome::Single(outcome) => {
            let nutrition = single_outcome(outcome)?;
            Ok(Json(ScanResponse::Single(nutrition)))
        }
        AggregateOutcome::Multiple(results) => Ok(Json(ScanResponse::Multiple { results })),
    }
}

async fn read_image_field(mut multipart: Multipart) -> ApiResult<Bytes> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
    {
        if field.name() == Some("image") {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            if data.is_empty() {
                return Err(ApiError::NoImageProvided);
            }
            return Ok(data);
        }
    }
    Err(ApiError::NoImageProvided)
}

/// A singular outcome maps straight to the HTTP surface: Found is the body,
/// everything else is its own status.
fn single_outcome(outcome: LookupOutcome) -> ApiResult<CanonicalNutritionRecord> {
    match outcome {
        LookupOutcome::Found { nutrition } => Ok(nutrition),
        LookupOutcome::NotFound => Err(ApiError::NotFound),
        LookupOutcome::UpstreamError { message } => Err(ApiError::UpstreamError(message)),
        LookupOutcome::MalformedUpstreamData { message } => {
            Err(ApiError::MalformedUpstreamData(message))
        }
    }
}
