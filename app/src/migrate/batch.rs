use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder,
};
use serde::Serialize;

use crate::catalog::CatalogService;
use crate::config::MatchingConfig;
use crate::entity::status::{MatchStatus, MigrationStatus, ProjectStatus};
use crate::entity::{sccm_application, sccm_migration};
use crate::matching::{self, AppFacts, Classification, MatchOutcome};

use super::{recompute_counters, set_project_status};

#[derive(Debug, Default, Clone, Serialize)]
pub struct MatchRunReport {
    pub total: usize,
    pub matched: usize,
    pub partial: usize,
    pub unmatched: usize,
    /// Apps left in `pending` because the catalog lookup or the result write
    /// failed transiently.
    pub failed: usize,
    pub project_status: String,
}

/// Runs the matching engine over every eligible application of a project.
///
/// Catalog lookups fan out in bounded waves. Each wave settles completely
/// before any result is persisted, and the project counters are recomputed
/// after every wave so polling readers observe progress mid-run. A transient
/// failure leaves that one app `pending` and never aborts the run; once the
/// per-run failure count reaches the configured threshold the remaining apps
/// are skipped. The project always leaves `matching`: `ready` on success,
/// `error` past the threshold or when the run itself aborts.
pub async fn run_matching(
    db: &DatabaseConnection,
    catalog: &Arc<dyn CatalogService>,
    migration_id: i32,
    force_rematch: bool,
    config: &MatchingConfig,
) -> Result<MatchRunReport, DbErr> {
    let migration = sccm_migration::Entity::find_by_id(migration_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("sccm_migrations: {migration_id}")))?;

    set_project_status(db, migration, ProjectStatus::Matching).await?;

    let mut report = MatchRunReport::default();
    let run = run_waves(db, catalog, migration_id, force_rematch, config, &mut report).await;

    let status = match &run {
        Err(err) => {
            tracing::error!(migration_id, %err, "matching run aborted");
            ProjectStatus::Error
        }
        Ok(()) if report.failed >= config.failure_threshold() => ProjectStatus::Error,
        Ok(()) => ProjectStatus::Ready,
    };
    report.project_status = status.as_str().to_string();

    let migration = recompute_counters(db, migration_id).await?;
    set_project_status(db, migration, status).await?;

    run?;
    Ok(report)
}

async fn run_waves(
    db: &DatabaseConnection,
    catalog: &Arc<dyn CatalogService>,
    migration_id: i32,
    force_rematch: bool,
    config: &MatchingConfig,
    report: &mut MatchRunReport,
) -> Result<(), DbErr> {
    let mut query = sccm_application::Entity::find()
        .filter(sccm_application::Column::MigrationId.eq(migration_id))
        .filter(
            sccm_application::Column::MigrationStatus.ne(MigrationStatus::Excluded.as_str()),
        );
    if !force_rematch {
        query = query
            .filter(sccm_application::Column::MatchStatus.eq(MatchStatus::Pending.as_str()));
    }
    let apps = query
        .order_by_asc(sccm_application::Column::Id)
        .all(db)
        .await?;

    report.total = apps.len();

    let wave_size = config.wave_size().max(1);

    for wave_apps in apps.chunks(wave_size) {
        let mut wave = FuturesUnordered::new();
        for app in wave_apps {
            let catalog = Arc::clone(catalog);
            wave.push(async move {
                let query = matching::normalize_name(&app.name);
                let result = catalog.search(&query).await;
                (app, result)
            });
        }

        // Settle the whole wave before touching the database: one app's
        // write failure must not cancel its siblings' lookups.
        let mut settled = Vec::with_capacity(wave_apps.len());
        while let Some(entry) = wave.next().await {
            settled.push(entry);
        }

        for (app, result) in settled {
            let candidates = match result {
                Ok(candidates) => candidates,
                Err(err) => {
                    tracing::warn!(app_id = app.id, name = %app.name, %err, "catalog lookup failed, app stays pending");
                    report.failed += 1;
                    continue;
                }
            };

            let facts = AppFacts {
                name: &app.name,
                manufacturer: app.manufacturer.as_deref(),
                version: app.version.as_deref(),
            };
            let outcome = matching::match_application(&facts, &candidates, config);
            let classification = outcome.classification;

            if let Err(err) = persist_outcome(db, app, outcome).await {
                tracing::warn!(app_id = app.id, name = %app.name, %err, "could not persist match result, app stays pending");
                report.failed += 1;
                continue;
            }

            match classification {
                Classification::Matched => report.matched += 1,
                Classification::Partial => report.partial += 1,
                Classification::Unmatched => report.unmatched += 1,
            }
        }

        // Wave checkpoint: polling readers see counters advance per wave.
        recompute_counters(db, migration_id).await?;

        if report.failed >= config.failure_threshold() {
            break;
        }
    }

    Ok(())
}

async fn persist_outcome(
    db: &DatabaseConnection,
    app: &sccm_application::Model,
    outcome: MatchOutcome,
) -> Result<(), DbErr> {
    let mut active = app.clone().into_active_model();
    active.match_confidence = Set(outcome.confidence);

    match (outcome.classification, outcome.best) {
        (Classification::Matched, Some(best)) => {
            active.match_status = Set(MatchStatus::Matched.as_str().to_string());
            active.matched_package_id = Set(Some(best.id));
            active.matched_package_name = Set(Some(best.name));
            active.match_candidates = Set(None);
        }
        (Classification::Partial, _) => {
            let candidates = serde_json::to_value(&outcome.alternates)
                .map_err(|err| DbErr::Json(err.to_string()))?;
            active.match_status = Set(MatchStatus::Partial.as_str().to_string());
            active.matched_package_id = Set(None);
            active.matched_package_name = Set(None);
            active.match_candidates = Set(Some(candidates));
        }
        _ => {
            active.match_status = Set(MatchStatus::Unmatched.as_str().to_string());
            active.matched_package_id = Set(None);
            active.matched_package_name = Set(None);
            active.match_candidates = Set(None);
        }
    }

    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(())
}
