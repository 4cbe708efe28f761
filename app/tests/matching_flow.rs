mod support;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use intuneget::catalog::{
    CandidatePackage, CatalogError, CatalogService, InMemoryCatalog, PackageManifest,
};
use intuneget::config::MatchingConfig;
use intuneget::entity::status::{MatchStatus, MigrationStatus, ProjectStatus};
use intuneget::entity::{sccm_application, sccm_migration};
use intuneget::migrate::{exclude, link_manual, run_matching};

use support::{AppSeed, FlakyCatalog, arc_catalog, seed_app, seed_migration, setup_db};

fn catalog_packages() -> Vec<CandidatePackage> {
    vec![
        CandidatePackage {
            id: "Google.Chrome".to_string(),
            name: "Google Chrome".to_string(),
            publisher: Some("Google LLC".to_string()),
            version: Some("120.0".to_string()),
        },
        CandidatePackage {
            id: "Google.ChromeAlt".to_string(),
            name: "Chrome".to_string(),
            publisher: Some("Google LLC".to_string()),
            version: None,
        },
    ]
}

async fn reload_app(
    db: &sea_orm::DatabaseConnection,
    id: i32,
) -> sccm_application::Model {
    sccm_application::Entity::find_by_id(id)
        .one(db)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn matching_run_classifies_and_recomputes_counters() {
    let db = setup_db().await;
    let migration = seed_migration(&db, "wave one").await;

    let exact = seed_app(
        &db,
        migration.id,
        AppSeed::pending("Google Chrome", Some("Google LLC")),
    )
    .await;
    let partial = seed_app(
        &db,
        migration.id,
        AppSeed::pending("Chrome", Some("Contoso")),
    )
    .await;
    let internal = seed_app(
        &db,
        migration.id,
        AppSeed::pending("Internal Payroll Tool v3", Some("Acme Corp IT")),
    )
    .await;
    let flaky = seed_app(
        &db,
        migration.id,
        AppSeed::pending("Xyzzy Deploy Tool", Some("Xyzzy Inc")),
    )
    .await;

    let catalog = arc_catalog(FlakyCatalog {
        inner: InMemoryCatalog::with_packages(catalog_packages()),
        fail_marker: "xyzzy".to_string(),
    });

    let report = run_matching(&db, &catalog, migration.id, false, &MatchingConfig::default())
        .await
        .unwrap();

    assert_eq!(report.total, 4);
    assert_eq!(report.matched, 1);
    assert_eq!(report.partial, 1);
    assert_eq!(report.unmatched, 1);
    assert_eq!(report.failed, 1);

    let exact = reload_app(&db, exact.id).await;
    assert_eq!(exact.match_status, MatchStatus::Matched.as_str());
    assert_eq!(exact.matched_package_id.as_deref(), Some("Google.Chrome"));
    assert!(exact.match_confidence.unwrap() >= 0.85);
    assert!(exact.match_candidates.is_none());

    let partial = reload_app(&db, partial.id).await;
    assert_eq!(partial.match_status, MatchStatus::Partial.as_str());
    assert!(partial.matched_package_id.is_none());
    let candidates = partial.match_candidates.expect("partial keeps candidates");
    assert!(!candidates.as_array().unwrap().is_empty());

    let internal = reload_app(&db, internal.id).await;
    assert_eq!(internal.match_status, MatchStatus::Unmatched.as_str());
    assert!(internal.match_candidates.is_none());

    // The transient catalog failure leaves the app pending for a retry.
    let flaky = reload_app(&db, flaky.id).await;
    assert_eq!(flaky.match_status, MatchStatus::Pending.as_str());

    let migration = sccm_migration::Entity::find_by_id(migration.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(migration.status, ProjectStatus::Ready.as_str());
    assert_eq!(migration.total_apps, 4);
    assert_eq!(migration.matched_apps, 1);
    assert_eq!(migration.partial_match_apps, 1);
    assert_eq!(migration.unmatched_apps, 1);
    assert_eq!(migration.migrated_apps, 0);
    assert_eq!(migration.failed_apps, 0);
}

#[tokio::test]
async fn rerun_without_force_only_retries_pending_apps() {
    let db = setup_db().await;
    let migration = seed_migration(&db, "retry").await;

    seed_app(
        &db,
        migration.id,
        AppSeed::pending("Google Chrome", Some("Google LLC")),
    )
    .await;
    let flaky = seed_app(
        &db,
        migration.id,
        AppSeed::pending("Xyzzy Deploy Tool", None),
    )
    .await;

    let failing = arc_catalog(FlakyCatalog {
        inner: InMemoryCatalog::with_packages(catalog_packages()),
        fail_marker: "xyzzy".to_string(),
    });
    run_matching(&db, &failing, migration.id, false, &MatchingConfig::default())
        .await
        .unwrap();

    // Second run with a healthy catalog touches only the pending app.
    let healthy = arc_catalog(InMemoryCatalog::with_packages(catalog_packages()));
    let report = run_matching(&db, &healthy, migration.id, false, &MatchingConfig::default())
        .await
        .unwrap();

    assert_eq!(report.total, 1);
    let flaky = reload_app(&db, flaky.id).await;
    assert_eq!(flaky.match_status, MatchStatus::Unmatched.as_str());
}

#[tokio::test]
async fn failure_threshold_flips_the_project_to_error() {
    let db = setup_db().await;
    let migration = seed_migration(&db, "dead catalog").await;

    for i in 0..3 {
        seed_app(
            &db,
            migration.id,
            AppSeed::pending(&format!("Xyzzy Tool {i}"), None),
        )
        .await;
    }

    let catalog = arc_catalog(FlakyCatalog {
        inner: InMemoryCatalog::new(),
        fail_marker: "xyzzy".to_string(),
    });

    let config = MatchingConfig {
        failure_threshold: Some(2),
        ..Default::default()
    };
    let report = run_matching(&db, &catalog, migration.id, false, &config)
        .await
        .unwrap();

    assert!(report.failed >= 2);
    let migration = sccm_migration::Entity::find_by_id(migration.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(migration.status, ProjectStatus::Error.as_str());
}

/// Catalog that samples the project's matched counter on every lookup, so a
/// test can observe what a polling reader would see mid-run.
struct CounterReadingCatalog {
    inner: InMemoryCatalog,
    db: DatabaseConnection,
    migration_id: i32,
    observed_matched: Mutex<Vec<i32>>,
}

#[async_trait]
impl CatalogService for CounterReadingCatalog {
    async fn search(&self, query: &str) -> Result<Vec<CandidatePackage>, CatalogError> {
        let migration = sccm_migration::Entity::find_by_id(self.migration_id)
            .one(&self.db)
            .await
            .map_err(|err| CatalogError::Unavailable(err.to_string()))?
            .expect("migration row exists");
        self.observed_matched
            .lock()
            .unwrap()
            .push(migration.matched_apps);
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

#[tokio::test]
async fn counters_advance_between_waves() {
    let db = setup_db().await;
    let migration = seed_migration(&db, "progress").await;

    for _ in 0..2 {
        seed_app(
            &db,
            migration.id,
            AppSeed::pending("Google Chrome", Some("Google LLC")),
        )
        .await;
    }

    let counting = Arc::new(CounterReadingCatalog {
        inner: InMemoryCatalog::with_packages(catalog_packages()),
        db: db.clone(),
        migration_id: migration.id,
        observed_matched: Mutex::new(Vec::new()),
    });
    let catalog: Arc<dyn CatalogService> = counting.clone();

    let config = MatchingConfig {
        wave_size: Some(1),
        ..Default::default()
    };
    let report = run_matching(&db, &catalog, migration.id, false, &config)
        .await
        .unwrap();

    assert_eq!(report.matched, 2);

    // The second wave's lookup already sees the first wave's match counted:
    // counters are recomputed per wave, not once at the end.
    let observed = counting.observed_matched.lock().unwrap().clone();
    assert_eq!(observed, vec![0, 1]);
}

#[tokio::test]
async fn manual_link_and_exclude_recompute_counters() {
    let db = setup_db().await;
    let migration = seed_migration(&db, "manual").await;

    let partial = seed_app(
        &db,
        migration.id,
        AppSeed::pending("Chrome", Some("Contoso")),
    )
    .await;
    let stray = seed_app(
        &db,
        migration.id,
        AppSeed::pending("Internal Payroll Tool v3", Some("Acme Corp IT")),
    )
    .await;

    let catalog = arc_catalog(InMemoryCatalog::with_packages(catalog_packages()));
    run_matching(&db, &catalog, migration.id, false, &MatchingConfig::default())
        .await
        .unwrap();

    let partial = reload_app(&db, partial.id).await;
    let linked = link_manual(
        &db,
        partial,
        "Google.Chrome".to_string(),
        "Google Chrome".to_string(),
    )
    .await
    .unwrap();

    assert_eq!(linked.match_status, MatchStatus::Manual.as_str());
    assert_eq!(linked.matched_package_id.as_deref(), Some("Google.Chrome"));
    // An operator's choice is definitive.
    assert_eq!(linked.match_confidence, Some(1.0));
    assert!(linked.match_candidates.is_none());

    let migration_row = sccm_migration::Entity::find_by_id(migration.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(migration_row.matched_apps, 1);
    assert_eq!(migration_row.partial_match_apps, 0);

    let stray = reload_app(&db, stray.id).await;
    let excluded = exclude(&db, stray).await.unwrap();
    assert_eq!(excluded.migration_status, MigrationStatus::Excluded.as_str());

    // Counters stay consistent with a fresh recount after every mutation.
    let migration_row = sccm_migration::Entity::find_by_id(migration.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let apps = sccm_application::Entity::find()
        .filter(sccm_application::Column::MigrationId.eq(migration.id))
        .all(&db)
        .await
        .unwrap();
    let matched = apps
        .iter()
        .filter(|app| {
            app.match_status == MatchStatus::Matched.as_str()
                || app.match_status == MatchStatus::Manual.as_str()
        })
        .count();
    assert_eq!(migration_row.matched_apps as usize, matched);
    assert_eq!(migration_row.total_apps as usize, apps.len());
}
