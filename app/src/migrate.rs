pub mod batch;
pub mod pipeline;

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter,
};

use crate::entity::status::{MatchStatus, MigrationStatus, ProjectStatus};
use crate::entity::{sccm_application, sccm_migration};

pub use batch::{MatchRunReport, run_matching};
pub use pipeline::{
    ExecuteReport, MigrateOptions, PreviewItem, PreviewReport, execute, preview,
};

/// Recomputes every aggregate counter on the project row from fresh count
/// queries over the child applications. Counters are never adjusted
/// incrementally; every mutation path ends here.
pub async fn recompute_counters(
    db: &DatabaseConnection,
    migration_id: i32,
) -> Result<sccm_migration::Model, DbErr> {
    let scoped = || {
        sccm_application::Entity::find()
            .filter(sccm_application::Column::MigrationId.eq(migration_id))
    };

    let total = scoped().count(db).await?;
    let matched = scoped()
        .filter(sccm_application::Column::MatchStatus.is_in([
            MatchStatus::Matched.as_str(),
            MatchStatus::Manual.as_str(),
        ]))
        .count(db)
        .await?;
    let partial = scoped()
        .filter(sccm_application::Column::MatchStatus.eq(MatchStatus::Partial.as_str()))
        .count(db)
        .await?;
    let unmatched = scoped()
        .filter(sccm_application::Column::MatchStatus.eq(MatchStatus::Unmatched.as_str()))
        .count(db)
        .await?;
    let migrated = scoped()
        .filter(sccm_application::Column::MigrationStatus.eq(MigrationStatus::Migrated.as_str()))
        .count(db)
        .await?;
    let failed = scoped()
        .filter(sccm_application::Column::MigrationStatus.eq(MigrationStatus::Failed.as_str()))
        .count(db)
        .await?;

    let migration = sccm_migration::Entity::find_by_id(migration_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("sccm_migrations: {migration_id}")))?;

    let mut active = migration.into_active_model();
    active.total_apps = Set(total as i32);
    active.matched_apps = Set(matched as i32);
    active.partial_match_apps = Set(partial as i32);
    active.unmatched_apps = Set(unmatched as i32);
    active.migrated_apps = Set(migrated as i32);
    active.failed_apps = Set(failed as i32);
    active.updated_at = Set(Utc::now());
    active.update(db).await
}

pub(crate) async fn set_project_status(
    db: &DatabaseConnection,
    migration: sccm_migration::Model,
    status: ProjectStatus,
) -> Result<sccm_migration::Model, DbErr> {
    let mut active = migration.into_active_model();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Utc::now());
    active.update(db).await
}

/// Links an application to a package chosen by the operator. A manual link
/// participates in migration exactly like an automatic match.
pub async fn link_manual(
    db: &DatabaseConnection,
    app: sccm_application::Model,
    package_id: String,
    package_name: String,
) -> Result<sccm_application::Model, DbErr> {
    let migration_id = app.migration_id;

    let mut active = app.into_active_model();
    active.match_status = Set(MatchStatus::Manual.as_str().to_string());
    active.match_confidence = Set(Some(1.0));
    active.matched_package_id = Set(Some(package_id));
    active.matched_package_name = Set(Some(package_name));
    active.match_candidates = Set(None);
    active.updated_at = Set(Utc::now());
    let updated = active.update(db).await?;

    recompute_counters(db, migration_id).await?;
    Ok(updated)
}

/// Excludes an application from migration. The match linkage is left intact
/// so the exclusion can be reasoned about afterwards.
pub async fn exclude(
    db: &DatabaseConnection,
    app: sccm_application::Model,
) -> Result<sccm_application::Model, DbErr> {
    let migration_id = app.migration_id;

    let mut active = app.into_active_model();
    active.migration_status = Set(MigrationStatus::Excluded.as_str().to_string());
    active.updated_at = Set(Utc::now());
    let updated = active.update(db).await?;

    recompute_counters(db, migration_id).await?;
    Ok(updated)
}
