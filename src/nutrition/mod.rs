mod dto;
pub mod handlers;
pub mod services;

pub use dto::{
    AggregateOutcome, BarcodeResult, CanonicalNutritionRecord, LookupOutcome, ScanResponse,
};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
