use crate::barcode::{BarcodeDecoder, ImageBarcodeDecoder};
use crate::config::AppConfig;
use crate::openfoodfacts::{OpenFoodFactsClient, ProductDatabase};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub products: Arc<dyn ProductDatabase>,
    pub decoder: Arc<dyn BarcodeDecoder>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let products =
            Arc::new(OpenFoodFactsClient::new(&config)?) as Arc<dyn ProductDatabase>;
        let decoder = Arc::new(ImageBarcodeDecoder::new()) as Arc<dyn BarcodeDecoder>;

        Ok(Self {
            config,
            products,
            decoder,
        })
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        products: Arc<dyn ProductDatabase>,
        decoder: Arc<dyn BarcodeDecoder>,
    ) -> Self {
        Self {
            config,
            products,
            decoder,
        }
    }
}
