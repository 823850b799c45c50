use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub off_base_url: String,
    pub upstream_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let off_base_url = std::env::var("OFF_BASE_URL")
            .unwrap_or_else(|_| "https://world.openfoodfacts.org".into());
        let upstream_timeout_secs = std::env::var("UPSTREAM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(10);
        Ok(Self {
            off_base_url,
            upstream_timeout_secs,
        })
    }
}
