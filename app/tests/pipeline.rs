mod support;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;

use intuneget::audit::TracingAudit;
use intuneget::catalog::{CandidatePackage, InMemoryCatalog, Installer, PackageManifest};
use intuneget::deployment::{CartPayload, ConfigSource};
use intuneget::entity::status::{MigrationStatus, ProjectStatus};
use intuneget::entity::{cart_item, sccm_application, sccm_migration};
use intuneget::migrate::{MigrateOptions, exclude, execute, preview};

use support::{AppSeed, arc_catalog, identity, seed_app, seed_migration, setup_db};

fn pipeline_catalog() -> InMemoryCatalog {
    let mut catalog = InMemoryCatalog::with_packages(vec![
        CandidatePackage {
            id: "Vendor.GoodApp".to_string(),
            name: "Good App".to_string(),
            publisher: Some("Vendor".to_string()),
            version: Some("2.0".to_string()),
        },
        CandidatePackage {
            id: "Vendor.EmptyApp".to_string(),
            name: "Bare App".to_string(),
            publisher: Some("Vendor".to_string()),
            version: None,
        },
        CandidatePackage {
            id: "Vendor.NoManifest".to_string(),
            name: "Missing App".to_string(),
            publisher: Some("Vendor".to_string()),
            version: None,
        },
    ]);

    catalog.insert_manifest(PackageManifest {
        package_id: "Vendor.GoodApp".to_string(),
        version: Some("2.0".to_string()),
        installers: vec![Installer {
            architecture: Some("x64".to_string()),
            installer_type: Some("msi".to_string()),
            url: "https://downloads.example.com/goodapp.msi".to_string(),
            sha256: Some("abc123".to_string()),
            silent_switches: None,
            product_code: Some("{GOOD-APP}".to_string()),
        }],
    });
    catalog.insert_manifest(PackageManifest {
        package_id: "Vendor.EmptyApp".to_string(),
        version: None,
        installers: vec![],
    });

    catalog
}

fn good_app_seed() -> AppSeed<'static> {
    AppSeed {
        detection_rules: Some(json!([
            {"type": "msi", "product_code": "{SCCM-GOOD}"}
        ])),
        install_command: Some("msiexec /i goodapp.msi /qn"),
        ..AppSeed::matched("Good App", "Vendor.GoodApp")
    }
}

async fn seed_pipeline_apps(
    db: &sea_orm::DatabaseConnection,
    migration_id: i32,
) -> (i32, i32, i32, i32) {
    let good = seed_app(db, migration_id, good_app_seed()).await;
    let bare = seed_app(
        db,
        migration_id,
        AppSeed::matched("Bare App", "Vendor.EmptyApp"),
    )
    .await;
    let missing = seed_app(
        db,
        migration_id,
        AppSeed::matched("Missing App", "Vendor.NoManifest"),
    )
    .await;
    let store = seed_app(
        db,
        migration_id,
        AppSeed::matched("Store App", "9NBLGGH4NNS1"),
    )
    .await;

    (good.id, bare.id, missing.id, store.id)
}

#[tokio::test]
async fn preview_reports_blockers_without_writing() {
    let db = setup_db().await;
    let migration = seed_migration(&db, "preview").await;
    let (good_id, bare_id, missing_id, _store_id) =
        seed_pipeline_apps(&db, migration.id).await;

    let catalog = arc_catalog(pipeline_catalog());
    let report = preview(
        &db,
        catalog.as_ref(),
        migration.id,
        &[],
        &MigrateOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(report.total_apps, 4);
    assert_eq!(report.migratable, 2);
    assert_eq!(report.blocked, 2);

    let good = report
        .items
        .iter()
        .find(|item| item.application_id == good_id)
        .unwrap();
    assert!(good.ready);
    assert_eq!(good.detection_source, Some(ConfigSource::SccmPreserved));
    assert_eq!(good.command_source, Some(ConfigSource::SccmPreserved));

    let bare = report
        .items
        .iter()
        .find(|item| item.application_id == bare_id)
        .unwrap();
    assert!(!bare.ready);
    assert_eq!(
        bare.reason.as_deref(),
        Some("insufficient configuration data")
    );

    let missing = report
        .items
        .iter()
        .find(|item| item.application_id == missing_id)
        .unwrap();
    assert!(!missing.ready);
    assert!(missing.reason.as_deref().unwrap().contains("no catalog manifest"));

    // Dry run: nothing was persisted.
    let cart = cart_item::Entity::find().all(&db).await.unwrap();
    assert!(cart.is_empty());
    let apps = sccm_application::Entity::find()
        .filter(sccm_application::Column::MigrationId.eq(migration.id))
        .all(&db)
        .await
        .unwrap();
    assert!(
        apps.iter()
            .all(|app| app.migration_status == MigrationStatus::Pending.as_str())
    );
}

#[tokio::test]
async fn execute_fills_the_cart_and_accounts_for_every_app() {
    let db = setup_db().await;
    let migration = seed_migration(&db, "execute").await;
    let (good_id, bare_id, missing_id, store_id) =
        seed_pipeline_apps(&db, migration.id).await;

    let catalog = arc_catalog(pipeline_catalog());
    let audit = TracingAudit;
    let report = execute(
        &db,
        catalog.as_ref(),
        &audit,
        &identity(),
        migration.id,
        &[],
        &MigrateOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(report.total_attempted, 4);
    assert_eq!(report.successful, 2);
    assert_eq!(report.failed, 0);
    // The two unresolvable apps fail the can-migrate recheck: skipped, not
    // failed, and their rows stay pending.
    assert_eq!(report.skipped, 2);
    assert_eq!(
        report.successful + report.failed + report.skipped,
        report.total_attempted
    );
    assert_eq!(report.cart_item_ids.len(), 2);

    let cart = cart_item::Entity::find().all(&db).await.unwrap();
    assert_eq!(cart.len(), 2);

    for item in &cart {
        let payload: CartPayload = serde_json::from_value(item.payload.clone()).unwrap();
        match payload {
            CartPayload::Win32 {
                winget_id,
                install_command,
                detection_rules,
                detection_source,
                command_source,
                ..
            } => {
                assert_eq!(winget_id, "Vendor.GoodApp");
                // Every cart item can be verified or installed.
                assert!(!detection_rules.is_empty() || install_command.is_some());
                assert_eq!(detection_source, ConfigSource::SccmPreserved);
                assert_eq!(command_source, ConfigSource::SccmPreserved);
            }
            CartPayload::Store { store_product_id } => {
                assert_eq!(store_product_id, "9NBLGGH4NNS1");
            }
        }
    }

    let statuses = |id: i32| {
        let db = db.clone();
        async move {
            sccm_application::Entity::find_by_id(id)
                .one(&db)
                .await
                .unwrap()
                .unwrap()
                .migration_status
        }
    };
    assert_eq!(statuses(good_id).await, MigrationStatus::Migrated.as_str());
    assert_eq!(statuses(store_id).await, MigrationStatus::Migrated.as_str());
    assert_eq!(statuses(bare_id).await, MigrationStatus::Pending.as_str());
    assert_eq!(statuses(missing_id).await, MigrationStatus::Pending.as_str());

    let migration = sccm_migration::Entity::find_by_id(migration.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(migration.migrated_apps, 2);
    assert_eq!(migration.failed_apps, 0);
    assert_eq!(migration.status, ProjectStatus::Ready.as_str());
    assert!(migration.last_migration_at.is_some());
}

#[tokio::test]
async fn execute_twice_skips_already_processed_apps() {
    let db = setup_db().await;
    let migration = seed_migration(&db, "rerun").await;
    seed_pipeline_apps(&db, migration.id).await;

    let catalog = arc_catalog(pipeline_catalog());
    let audit = TracingAudit;

    execute(
        &db,
        catalog.as_ref(),
        &audit,
        &identity(),
        migration.id,
        &[],
        &MigrateOptions::default(),
    )
    .await
    .unwrap();

    let report = execute(
        &db,
        catalog.as_ref(),
        &audit,
        &identity(),
        migration.id,
        &[],
        &MigrateOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(report.total_attempted, 4);
    assert_eq!(report.successful, 0);
    assert_eq!(report.failed, 0);
    assert_eq!(report.skipped, 4);

    // No duplicate cart items.
    let cart = cart_item::Entity::find().all(&db).await.unwrap();
    assert_eq!(cart.len(), 2);
}

#[tokio::test]
async fn requested_subset_scopes_preview_and_execute() {
    let db = setup_db().await;
    let migration = seed_migration(&db, "subset").await;

    let good = seed_app(&db, migration.id, good_app_seed()).await;
    let unmatched = seed_app(&db, migration.id, AppSeed::pending("Unknown Tool", None)).await;
    let store = seed_app(
        &db,
        migration.id,
        AppSeed::matched("Store App", "9NBLGGH4NNS1"),
    )
    .await;
    let excluded = exclude(&db, store).await.unwrap();
    let untouched = seed_app(
        &db,
        migration.id,
        AppSeed::matched("Missing App", "Vendor.NoManifest"),
    )
    .await;

    let catalog = arc_catalog(pipeline_catalog());
    let requested = [good.id, unmatched.id, excluded.id];

    let report = preview(
        &db,
        catalog.as_ref(),
        migration.id,
        &requested,
        &MigrateOptions::default(),
    )
    .await
    .unwrap();

    // Only the requested ids appear, each accounted for exactly once.
    assert_eq!(report.total_apps, 3);
    assert_eq!(report.migratable, 1);
    assert_eq!(report.blocked, 2);

    let unmatched_item = report
        .items
        .iter()
        .find(|item| item.application_id == unmatched.id)
        .unwrap();
    assert_eq!(unmatched_item.reason.as_deref(), Some("no package match"));

    let excluded_item = report
        .items
        .iter()
        .find(|item| item.application_id == excluded.id)
        .unwrap();
    assert_eq!(
        excluded_item.reason.as_deref(),
        Some("application is excluded")
    );

    let report = execute(
        &db,
        catalog.as_ref(),
        &TracingAudit,
        &identity(),
        migration.id,
        &requested,
        &MigrateOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(report.total_attempted, 3);
    assert_eq!(report.successful, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.cart_item_ids.len(), 1);

    // The linked app outside the request was never touched.
    let untouched = sccm_application::Entity::find_by_id(untouched.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.migration_status, MigrationStatus::Pending.as_str());
    let cart = cart_item::Entity::find().all(&db).await.unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].application_id, Some(good.id));
}

#[tokio::test]
async fn preserved_sccm_data_wins_over_catalog_defaults() {
    let db = setup_db().await;
    let migration = seed_migration(&db, "precedence").await;
    let app = seed_app(&db, migration.id, good_app_seed()).await;

    let catalog = arc_catalog(pipeline_catalog());
    let options = MigrateOptions {
        use_winget_defaults: true,
        ..Default::default()
    };
    let report = preview(&db, catalog.as_ref(), migration.id, &[], &options)
        .await
        .unwrap();

    let item = report
        .items
        .iter()
        .find(|item| item.application_id == app.id)
        .unwrap();
    assert!(item.ready);
    // Preservation is checked before catalog defaults even when defaults are
    // requested.
    assert_eq!(item.detection_source, Some(ConfigSource::SccmPreserved));
    assert_eq!(item.command_source, Some(ConfigSource::SccmPreserved));
}

#[tokio::test]
async fn catalog_defaults_apply_when_preservation_is_disabled() {
    let db = setup_db().await;
    let migration = seed_migration(&db, "defaults").await;
    let app = seed_app(&db, migration.id, good_app_seed()).await;

    let catalog = arc_catalog(pipeline_catalog());
    let options = MigrateOptions {
        preserve_detection: false,
        preserve_install_commands: false,
        use_winget_defaults: true,
    };
    let report = preview(&db, catalog.as_ref(), migration.id, &[], &options)
        .await
        .unwrap();

    let item = report
        .items
        .iter()
        .find(|item| item.application_id == app.id)
        .unwrap();
    assert!(item.ready);
    assert_eq!(item.detection_source, Some(ConfigSource::WingetDefault));
    // The manifest installer carries no explicit switches; they are derived
    // from the installer type.
    assert_eq!(item.command_source, Some(ConfigSource::Synthesized));
}

#[tokio::test]
async fn missing_sccm_data_falls_back_to_synthesized_sources() {
    let db = setup_db().await;
    let migration = seed_migration(&db, "synthesized").await;
    // Linked, but nothing preserved from SCCM and no opt-in to catalog
    // defaults.
    let app = seed_app(
        &db,
        migration.id,
        AppSeed::matched("Good App", "Vendor.GoodApp"),
    )
    .await;

    let catalog = arc_catalog(pipeline_catalog());
    let report = preview(
        &db,
        catalog.as_ref(),
        migration.id,
        &[],
        &MigrateOptions::default(),
    )
    .await
    .unwrap();

    let item = report
        .items
        .iter()
        .find(|item| item.application_id == app.id)
        .unwrap();
    assert!(item.ready);
    assert_eq!(item.detection_source, Some(ConfigSource::Synthesized));
    assert_eq!(item.command_source, Some(ConfigSource::Synthesized));
    assert!(!item.warnings.is_empty());
}
