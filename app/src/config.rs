pub mod auth;
pub mod catalog;
pub mod database;
pub mod dispatch;
pub mod logger;
pub mod matching;
pub mod server;
pub mod updates;

pub(crate) use std::sync::LazyLock;

use anyhow::Context;
use config::Config;
use serde::Deserialize;

pub use catalog::CatalogConfig;
pub use database::DatabaseConfig;
pub use dispatch::DispatchConfig;
pub use matching::MatchingConfig;
pub use server::ServerConfig;
pub use updates::UpdatesConfig;

use crate::config::{auth::AuthConfig, logger::LoggerConfig};

static APPCONFIG: LazyLock<AppConfig> =
    LazyLock::new(|| AppConfig::load().expect("Failed to load application configuration"));

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    database: DatabaseConfig,
    #[serde(default)]
    auth: AuthConfig,
    #[serde(default)]
    catalog: CatalogConfig,
    #[serde(default)]
    dispatch: DispatchConfig,
    #[serde(default)]
    matching: MatchingConfig,
    #[serde(default)]
    updates: UpdatesConfig,
    #[serde(default)]
    logger: LoggerConfig,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config = Config::builder()
            .add_source(
                config::File::with_name("application")
                    .format(config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix("APP")
                    .try_parsing(true)
                    .separator("_"),
            )
            .build()
            .with_context(|| "Failed to read The Configuration")?
            .try_deserialize()
            .with_context(|| "Failed to deserialize The Configuration");

        config
    }

    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    pub fn database(&self) -> &DatabaseConfig {
        &self.database
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    pub fn catalog(&self) -> &CatalogConfig {
        &self.catalog
    }

    pub fn dispatch(&self) -> &DispatchConfig {
        &self.dispatch
    }

    pub fn matching(&self) -> &MatchingConfig {
        &self.matching
    }

    pub fn updates(&self) -> &UpdatesConfig {
        &self.updates
    }

    pub fn logger(&self) -> &LoggerConfig {
        &self.logger
    }
}

pub fn get() -> &'static AppConfig {
    &APPCONFIG
}
