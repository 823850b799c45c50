use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::openfoodfacts::{FetchError, FetchOutcome, ProductDatabase};

use super::dto::{AggregateOutcome, BarcodeResult, CanonicalNutritionRecord, LookupOutcome};

/// Maps one upstream product payload to the canonical USDA-style record.
///
/// Total function: a missing or non-numeric nutrient yields `0`, never an
/// error. Values are passed through unvalidated; upstream data is trusted
/// as-is, negatives included. `sodium_100g` arrives in grams and is scaled
/// to milligrams, a fixed rule.
pub fn normalize(product: &Value) -> CanonicalNutritionRecord {
    let nutriments = product.get("nutriments");
    let field = |key: &str| -> f64 {
        nutriments
            .and_then(|n| n.get(key))
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    };

    CanonicalNutritionRecord {
        energy_kcal: field("energy-kcal_100g"),
        protein_g: field("proteins_100g"),
        fat_g: field("fat_100g"),
        carbohydrate_g: field("carbohydrates_100g"),
        sugars_g: field("sugars_100g"),
        fiber_g: 0.0,
        calcium_mg: 0.0,
        iron_mg: 0.0,
        sodium_mg: field("sodium_100g") * 1000.0,
        saturated_fat_g: field("saturated-fat_100g"),
        trans_fat_g: field("trans-fat_100g"),
        added_sugars_g: field("added-sugars_100g"),
        cholesterol_mg: 0.0,
    }
}

/// Resolves one barcode to a typed outcome. All failure modes come back as
/// `LookupOutcome` values; nothing propagates past this boundary.
pub async fn resolve(products: &dyn ProductDatabase, code: &str) -> LookupOutcome {
    let payload = match products.fetch_product(code).await {
        Ok(FetchOutcome::Payload(payload)) => payload,
        Ok(FetchOutcome::NotFound) => return LookupOutcome::NotFound,
        Err(FetchError::Transport(message)) => {
            warn!(code = %code, error = %message, "upstream call failed");
            return LookupOutcome::UpstreamError { message };
        }
        Err(FetchError::Decode(message)) => {
            warn!(code = %code, error = %message, "upstream body unreadable");
            return LookupOutcome::MalformedUpstreamData { message };
        }
    };

    if payload.get("status").and_then(Value::as_str) != Some("success") {
        return LookupOutcome::NotFound;
    }

    let Some(product) = payload.get("product") else {
        return LookupOutcome::NotFound;
    };

    match product.get("nutriments") {
        None => LookupOutcome::NotFound,
        Some(n) if !n.is_object() => LookupOutcome::MalformedUpstreamData {
            message: "nutriments is not an object".to_string(),
        },
        Some(_) => {
            debug!(code = %code, "product resolved");
            LookupOutcome::Found {
                nutrition: normalize(product),
            }
        }
    }
}

/// Resolves every barcode decoded from one image and assembles the combined
/// outcome.
///
/// One decoded barcode keeps its outcome singular; two or more produce a
/// sequence in decode order, each entry tagged with its barcode. Lookups run
/// concurrently, so total latency tracks the slowest upstream call, and
/// `join_all` keeps the output in input order no matter which call finishes
/// first. A failed lookup never disturbs its neighbours. Duplicate codes are
/// resolved independently; each occurrence was its own decode event.
pub async fn aggregate(
    products: &dyn ProductDatabase,
    codes: Vec<String>,
) -> Result<AggregateOutcome, ApiError> {
    match codes.len() {
        0 => Err(ApiError::NoBarcodes),
        1 => Ok(AggregateOutcome::Single(
            resolve(products, &codes[0]).await,
        )),
        _ => {
            let outcomes = join_all(codes.iter().map(|code| resolve(products, code))).await;
            let results = codes
                .into_iter()
                .zip(outcomes)
                .map(|(barcode, outcome)| BarcodeResult { barcode, outcome })
                .collect();
            Ok(AggregateOutcome::Multiple(results))
        }
    }
}

#[cfg(test)]
mod normalize_tests {
    use super::*;
    use rand::Rng;
    use serde_json::json;

    fn zero_record() -> CanonicalNutritionRecord {
        CanonicalNutritionRecord {
            energy_kcal: 0.0,
            protein_g: 0.0,
            fat_g: 0.0,
            carbohydrate_g: 0.0,
            sugars_g: 0.0,
            fiber_g: 0.0,
            calcium_mg: 0.0,
            iron_mg: 0.0,
            sodium_mg: 0.0,
            saturated_fat_g: 0.0,
            trans_fat_g: 0.0,
            added_sugars_g: 0.0,
            cholesterol_mg: 0.0,
        }
    }

    #[test]
    fn missing_nutriments_yields_complete_zeroed_record() {
        assert_eq!(normalize(&json!({})), zero_record());
        assert_eq!(normalize(&json!({ "nutriments": {} })), zero_record());
    }

    #[test]
    fn maps_known_fields_and_scales_sodium() {
        let product = json!({
            "nutriments": {
                "energy-kcal_100g": 250.0,
                "proteins_100g": 1.2,
                "fat_100g": 10.5,
                "carbohydrates_100g": 30.0,
                "sugars_100g": 12.0,
                "sodium_100g": 0.5,
                "saturated-fat_100g": 4.0,
                "trans-fat_100g": 0.1,
                "added-sugars_100g": 8.0,
            }
        });

        let record = normalize(&product);
        assert_eq!(record.energy_kcal, 250.0);
        assert_eq!(record.protein_g, 1.2);
        assert_eq!(record.fat_g, 10.5);
        assert_eq!(record.carbohydrate_g, 30.0);
        assert_eq!(record.sugars_g, 12.0);
        assert_eq!(record.sodium_mg, 500.0);
        assert_eq!(record.saturated_fat_g, 4.0);
        assert_eq!(record.trans_fat_g, 0.1);
        assert_eq!(record.added_sugars_g, 8.0);
    }

    #[test]
    fn sodium_is_always_upstream_grams_times_thousand() {
        let mut rng = rand::thread_rng();
        for _ in 0..256 {
            let sodium: f64 = rng.gen_range(0.0..100.0);
            let product = json!({ "nutriments": { "sodium_100g": sodium } });
            assert_eq!(normalize(&product).sodium_mg, sodium * 1000.0);
        }
    }

    #[test]
    fn unsupplied_fields_stay_zero_even_when_upstream_has_them() {
        let product = json!({
            "nutriments": {
                "fiber_100g": 7.0,
                "calcium_100g": 0.3,
                "iron_100g": 0.01,
                "cholesterol_100g": 0.02,
            }
        });

        let record = normalize(&product);
        assert_eq!(record.fiber_g, 0.0);
        assert_eq!(record.calcium_mg, 0.0);
        assert_eq!(record.iron_mg, 0.0);
        assert_eq!(record.cholesterol_mg, 0.0);
    }

    #[test]
    fn implausible_values_pass_through_unchanged() {
        let product = json!({ "nutriments": { "proteins_100g": -3.5 } });
        assert_eq!(normalize(&product).protein_g, -3.5);
    }

    #[test]
    fn non_numeric_values_default_to_zero() {
        let product = json!({ "nutriments": { "proteins_100g": "lots" } });
        assert_eq!(normalize(&product).protein_g, 0.0);
    }
}

#[cfg(test)]
mod resolve_tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    #[derive(Clone)]
    pub(super) enum Canned {
        Payload(Value),
        NotFound,
        Transport(String),
        Decode(String),
        /// Payload delivered after a delay, for completion-order tests.
        SlowPayload(u64, Value),
    }

    pub(super) struct FakeProductDb(pub HashMap<String, Canned>);

    #[async_trait]
    impl ProductDatabase for FakeProductDb {
        async fn fetch_product(&self, code: &str) -> Result<FetchOutcome, FetchError> {
            match self.0.get(code).cloned() {
                Some(Canned::Payload(payload)) => Ok(FetchOutcome::Payload(payload)),
                Some(Canned::SlowPayload(delay_ms, payload)) => {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    Ok(FetchOutcome::Payload(payload))
                }
                Some(Canned::Transport(message)) => Err(FetchError::Transport(message)),
                Some(Canned::Decode(message)) => Err(FetchError::Decode(message)),
                Some(Canned::NotFound) | None => Ok(FetchOutcome::NotFound),
            }
        }
    }

    pub(super) fn success_payload(nutriments: Value) -> Value {
        json!({ "status": "success", "product": { "nutriments": nutriments } })
    }

    fn db_with(code: &str, canned: Canned) -> FakeProductDb {
        FakeProductDb(HashMap::from([(code.to_string(), canned)]))
    }

    #[tokio::test]
    async fn successful_payload_resolves_to_found() {
        let db = db_with(
            "737628064502",
            Canned::Payload(success_payload(json!({ "proteins_100g": 9.0 }))),
        );

        match resolve(&db, "737628064502").await {
            LookupOutcome::Found { nutrition } => assert_eq!(nutrition.protein_g, 9.0),
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn upstream_404_resolves_to_not_found() {
        let db = db_with("000", Canned::NotFound);
        assert_eq!(resolve(&db, "000").await, LookupOutcome::NotFound);
    }

    #[tokio::test]
    async fn failure_status_resolves_to_not_found() {
        let db = db_with("000", Canned::Payload(json!({ "status": "failure" })));
        assert_eq!(resolve(&db, "000").await, LookupOutcome::NotFound);
    }

    #[tokio::test]
    async fn missing_nutriments_resolves_to_not_found() {
        let db = db_with(
            "000",
            Canned::Payload(json!({ "status": "success", "product": {} })),
        );
        assert_eq!(resolve(&db, "000").await, LookupOutcome::NotFound);
    }

    #[tokio::test]
    async fn non_object_nutriments_is_malformed() {
        let db = db_with(
            "000",
            Canned::Payload(json!({
                "status": "success",
                "product": { "nutriments": "oops" }
            })),
        );
        assert!(matches!(
            resolve(&db, "000").await,
            LookupOutcome::MalformedUpstreamData { .. }
        ));
    }

    #[tokio::test]
    async fn transport_failure_carries_its_description() {
        let db = db_with("000", Canned::Transport("connection refused".into()));
        match resolve(&db, "000").await {
            LookupOutcome::UpstreamError { message } => {
                assert!(message.contains("connection refused"))
            }
            other => panic!("expected UpstreamError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unreadable_body_is_malformed() {
        let db = db_with("000", Canned::Decode("expected value at line 1".into()));
        assert!(matches!(
            resolve(&db, "000").await,
            LookupOutcome::MalformedUpstreamData { .. }
        ));
    }
}
