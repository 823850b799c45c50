use serde::Serialize;

/// USDA-style nutrition facts, per 100g. Every field is always present in
/// output; a value the upstream source does not carry is `0`.
///
/// `fiber_g`, `calcium_mg`, `iron_mg` and `cholesterol_mg` are permanently
/// `0`: OpenFoodFacts does not supply them through the fields we read. This
/// is a known limitation of the integration, not missing data handling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalNutritionRecord {
    pub energy_kcal: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbohydrate_g: f64,
    pub sugars_g: f64,
    pub fiber_g: f64,
    pub calcium_mg: f64,
    pub iron_mg: f64,
    pub sodium_mg: f64,
    pub saturated_fat_g: f64,
    pub trans_fat_g: f64,
    pub added_sugars_g: f64,
    pub cholesterol_mg: f64,
}

/// Result of resolving one barcode against the product database.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LookupOutcome {
    Found { nutrition: CanonicalNutritionRecord },
    NotFound,
    UpstreamError { message: String },
    MalformedUpstreamData { message: String },
}

/// One entry of a plural response, tagged with the barcode that produced it
/// so consumers can correlate failures to specific codes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarcodeResult {
    pub barcode: String,
    #[serde(flatten)]
    pub outcome: LookupOutcome,
}

/// Combined result of resolving every barcode decoded from one image,
/// before HTTP status mapping.
#[derive(Debug)]
pub enum AggregateOutcome {
    /// Exactly one barcode was decoded; its outcome stands alone.
    Single(LookupOutcome),
    /// More than one barcode was decoded; outcomes in decode order.
    Multiple(Vec<BarcodeResult>),
}

/// Wire shape of a successful image scan. The singular/plural split follows
/// the number of barcodes decoded from the image and is part of the public
/// contract; `kind` is the discriminant so clients never have to infer the
/// shape from the JSON structure.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanResponse {
    /// Record fields inline next to the discriminant.
    Single(CanonicalNutritionRecord),
    Multiple { results: Vec<BarcodeResult> },
}
