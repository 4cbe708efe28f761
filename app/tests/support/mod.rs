#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;

use intuneget::auth::Identity;
use intuneget::catalog::{
    CandidatePackage, CatalogError, CatalogService, InMemoryCatalog, PackageManifest,
};
use intuneget::deployment::JobInputs;
use intuneget::dispatch::{DispatchError, DispatchReceipt, PackagingDispatch};
use intuneget::entity::status::{MatchStatus, MigrationStatus, PolicyType, ProjectStatus};
use intuneget::entity::{
    sccm_application, sccm_migration, update_check, update_policy, upload_history,
};

pub const USER: &str = "user-1";
pub const TENANT: &str = "tenant-1";

pub fn identity() -> Identity {
    Identity {
        user_id: USER.to_string(),
        tenant_id: TENANT.to_string(),
        email: None,
    }
}

pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("failed to open in-memory database");
    Migrator::up(&db, None).await.expect("migrations failed");
    db
}

pub async fn seed_migration(db: &DatabaseConnection, name: &str) -> sccm_migration::Model {
    let now = Utc::now();
    sccm_migration::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        user_id: Set(USER.to_string()),
        tenant_id: Set(TENANT.to_string()),
        status: Set(ProjectStatus::Importing.as_str().to_string()),
        total_apps: Set(0),
        matched_apps: Set(0),
        partial_match_apps: Set(0),
        unmatched_apps: Set(0),
        migrated_apps: Set(0),
        failed_apps: Set(0),
        last_migration_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed migration")
}

pub struct AppSeed<'a> {
    pub name: &'a str,
    pub manufacturer: Option<&'a str>,
    pub version: Option<&'a str>,
    pub detection_rules: Option<Value>,
    pub install_command: Option<&'a str>,
    pub match_status: MatchStatus,
    pub matched_package_id: Option<&'a str>,
}

impl<'a> AppSeed<'a> {
    pub fn pending(name: &'a str, manufacturer: Option<&'a str>) -> Self {
        Self {
            name,
            manufacturer,
            version: None,
            detection_rules: None,
            install_command: None,
            match_status: MatchStatus::Pending,
            matched_package_id: None,
        }
    }

    pub fn matched(name: &'a str, package_id: &'a str) -> Self {
        Self {
            name,
            manufacturer: None,
            version: None,
            detection_rules: None,
            install_command: None,
            match_status: MatchStatus::Matched,
            matched_package_id: Some(package_id),
        }
    }
}

pub async fn seed_app(
    db: &DatabaseConnection,
    migration_id: i32,
    seed: AppSeed<'_>,
) -> sccm_application::Model {
    let now = Utc::now();
    sccm_application::ActiveModel {
        migration_id: Set(migration_id),
        sccm_ci_id: Set(None),
        name: Set(seed.name.to_string()),
        manufacturer: Set(seed.manufacturer.map(str::to_string)),
        version: Set(seed.version.map(str::to_string)),
        technology: Set(Some("MSI".to_string())),
        is_deployed: Set(true),
        deployment_count: Set(1),
        match_status: Set(seed.match_status.as_str().to_string()),
        match_confidence: Set(None),
        matched_package_id: Set(seed.matched_package_id.map(str::to_string)),
        matched_package_name: Set(seed.matched_package_id.map(str::to_string)),
        match_candidates: Set(None),
        detection_rules: Set(seed.detection_rules),
        install_command: Set(seed.install_command.map(str::to_string)),
        uninstall_command: Set(None),
        install_behavior: Set(None),
        preserve_detection: Set(None),
        preserve_install_commands: Set(None),
        use_winget_defaults: Set(None),
        migration_status: Set(MigrationStatus::Pending.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed application")
}

pub async fn seed_update_check(
    db: &DatabaseConnection,
    winget_id: &str,
    latest_version: &str,
) -> update_check::Model {
    let now = Utc::now();
    update_check::ActiveModel {
        user_id: Set(USER.to_string()),
        tenant_id: Set(TENANT.to_string()),
        winget_id: Set(winget_id.to_string()),
        current_version: Set(Some("1.0.0".to_string())),
        latest_version: Set(latest_version.to_string()),
        detected_at: Set(now),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed update check")
}

pub async fn seed_policy(
    db: &DatabaseConnection,
    winget_id: &str,
    policy_type: PolicyType,
    is_enabled: bool,
    deployment_config: Value,
) -> update_policy::Model {
    let now = Utc::now();
    update_policy::ActiveModel {
        user_id: Set(USER.to_string()),
        tenant_id: Set(TENANT.to_string()),
        winget_id: Set(winget_id.to_string()),
        policy_type: Set(policy_type.as_str().to_string()),
        is_enabled: Set(is_enabled),
        deployment_config: Set(deployment_config),
        consecutive_failures: Set(0),
        last_auto_update_at: Set(None),
        upload_history_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed update policy")
}

pub async fn seed_upload_history(
    db: &DatabaseConnection,
    winget_id: &str,
    status: &str,
    deployment_config: Option<Value>,
) -> upload_history::Model {
    upload_history::ActiveModel {
        user_id: Set(USER.to_string()),
        tenant_id: Set(TENANT.to_string()),
        winget_id: Set(winget_id.to_string()),
        display_name: Set(Some(winget_id.to_string())),
        version: Set(Some("1.0.0".to_string())),
        status: Set(status.to_string()),
        deployment_config: Set(deployment_config),
        packaging_job_id: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to seed upload history")
}

/// Catalog that fails any search containing a marker substring. Everything
/// else is delegated to the wrapped in-memory catalog.
pub struct FlakyCatalog {
    pub inner: InMemoryCatalog,
    pub fail_marker: String,
}

#[async_trait]
impl CatalogService for FlakyCatalog {
    async fn search(&self, query: &str) -> Result<Vec<CandidatePackage>, CatalogError> {
        if query.contains(&self.fail_marker) {
            return Err(CatalogError::Unavailable("connection reset".to_string()));
        }
        self.inner.search(query).await
    }

    async fn manifest(
        &self,
        package_id: &str,
        version: Option<&str>,
    ) -> Result<Option<PackageManifest>, CatalogError> {
        self.inner.manifest(package_id, version).await
    }
}

/// Dispatch fake that records every job it receives.
#[derive(Default)]
pub struct RecordingDispatch {
    pub jobs: Mutex<Vec<JobInputs>>,
}

#[async_trait]
impl PackagingDispatch for RecordingDispatch {
    async fn dispatch(&self, inputs: &JobInputs) -> Result<DispatchReceipt, DispatchError> {
        let mut jobs = self.jobs.lock().unwrap();
        jobs.push(inputs.clone());
        Ok(DispatchReceipt {
            run_id: Some(format!("run-{}", jobs.len())),
            run_url: Some("https://ci.example.com/run".to_string()),
        })
    }
}

/// Dispatch fake that always fails.
#[derive(Default)]
pub struct FailingDispatch;

#[async_trait]
impl PackagingDispatch for FailingDispatch {
    async fn dispatch(&self, _inputs: &JobInputs) -> Result<DispatchReceipt, DispatchError> {
        Err(DispatchError::Unavailable("dispatch endpoint down".to_string()))
    }
}

pub fn arc_catalog(catalog: impl CatalogService + 'static) -> Arc<dyn CatalogService> {
    Arc::new(catalog)
}
