use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::audit::{AuditSink, TracingAudit};
use crate::catalog::{CatalogService, WingetCatalog};
use crate::dispatch::{HttpDispatch, LocalDispatch, PackagingDispatch};
use crate::{api, database, logger, server::Server};
use migration::{Migrator, MigratorTrait};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub catalog: Arc<dyn CatalogService>,
    pub dispatch: Arc<dyn PackagingDispatch>,
    pub audit: Arc<dyn AuditSink>,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        catalog: Arc<dyn CatalogService>,
        dispatch: Arc<dyn PackagingDispatch>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            db,
            catalog,
            dispatch,
            audit,
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let router = api::create_router();

    logger::init();

    tracing::info!("Starting application...");

    let db = database::init()
        .await
        .expect("Failed to initialize database");

    Migrator::up(&db, None).await?;

    let config = crate::config::get();

    let catalog: Arc<dyn CatalogService> = Arc::new(WingetCatalog::from_config(config.catalog())?);

    let dispatch: Arc<dyn PackagingDispatch> = if config.dispatch().local_packager() {
        Arc::new(LocalDispatch)
    } else {
        Arc::new(HttpDispatch::from_config(config.dispatch())?)
    };

    let audit: Arc<dyn AuditSink> = Arc::new(TracingAudit);

    let state = AppState::new(db, catalog, dispatch, audit);

    let server = Server::new(config.server());

    server.start(state, router).await?;

    Ok(())
}
