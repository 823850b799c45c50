use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("could not interpret the payload as an image: {0}")]
    InvalidImage(String),
}

/// Barcode recognition capability. Handlers only see this trait so tests can
/// substitute a canned decoder without touching any image machinery.
pub trait BarcodeDecoder: Send + Sync {
    /// Returns every barcode found in the image, in detection order.
    /// An image that contains no barcodes is `Ok(vec![])`, not an error.
    fn decode_barcodes(&self, bytes: &[u8]) -> Result<Vec<String>, DecodeError>;
}

/// Production decoder: `image` for pixel decoding, `rxing` for symbol
/// detection over the grayscale plane.
pub struct ImageBarcodeDecoder;

impl ImageBarcodeDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageBarcodeDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BarcodeDecoder for ImageBarcodeDecoder {
    fn decode_barcodes(&self, bytes: &[u8]) -> Result<Vec<String>, DecodeError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| DecodeError::InvalidImage(e.to_string()))?;
        let luma = img.to_luma8();
        let (width, height) = luma.dimensions();

        // rxing signals "nothing detected" through its error channel; for a
        // structurally valid image that is an empty result, not a failure.
        let detections =
            rxing::helpers::detect_multiple_in_luma(luma.into_raw(), width, height)
                .unwrap_or_default();

        let codes: Vec<String> = detections
            .iter()
            .map(|r| r.getText().to_string())
            .collect();
        tracing::debug!(count = codes.len(), "decoded barcodes from image");
        Ok(codes)
    }
}
