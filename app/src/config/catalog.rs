use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct CatalogConfig {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl CatalogConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or("http://localhost:8081")
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(30)
    }
}
