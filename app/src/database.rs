use std::cmp::max;

use crate::config;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

pub async fn init() -> anyhow::Result<DatabaseConnection> {
    let config = config::get().database();
    let mut options = ConnectOptions::new(config.url());
    options
        .min_connections(max(num_cpus::get() as u32 * 4, 10))
        .max_connections(max(num_cpus::get() as u32 * 8, 20))
        .connect_timeout(std::time::Duration::from_secs(8))
        .acquire_timeout(std::time::Duration::from_secs(30))
        .idle_timeout(std::time::Duration::from_secs(300))
        .max_lifetime(std::time::Duration::from_secs(3600))
        .sqlx_logging(true);

    if config.is_postgres() {
        options.set_schema_search_path(config.schema());
    }

    let db = Database::connect(options).await?;
    db.ping().await?;

    tracing::info!("Database connected successfully");

    Ok(db)
}
