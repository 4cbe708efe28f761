use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatesConfig {
    pub batch_limit: Option<usize>,
    pub wave_size: Option<usize>,
}

impl UpdatesConfig {
    /// Maximum update items accepted per trigger call.
    pub fn batch_limit(&self) -> usize {
        self.batch_limit.unwrap_or(10)
    }

    pub fn wave_size(&self) -> usize {
        self.wave_size.unwrap_or(5)
    }
}
