use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config;

/// Configured level wins over RUST_LOG; the fallback quiets the sqlx query
/// log, which drowns out the matching and trigger spans at info.
pub fn init() {
    let filter = config::get()
        .logger()
        .level()
        .map(|lvl| lvl.to_string())
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info,sqlx=warn".to_string());

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
