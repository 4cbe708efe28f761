use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct DispatchConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub timeout_seconds: Option<u64>,
    /// When true, packaging jobs are only recorded locally and never handed
    /// off to the workflow dispatch collaborator.
    pub local_packager: Option<bool>,
}

impl DispatchConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or("http://localhost:8082")
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(60)
    }

    pub fn local_packager(&self) -> bool {
        self.local_packager.unwrap_or(false)
    }
}
