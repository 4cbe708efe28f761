use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::audit::AuditSink;
use crate::auth::Identity;
use crate::catalog::{CatalogError, CatalogService, PackageManifest};
use crate::deployment::{CartPayload, ConfigSource, DetectionRule, silent_switches};
use crate::entity::status::{MatchStatus, MigrationStatus, ProjectStatus};
use crate::entity::{cart_item, sccm_application, sccm_migration};

use super::{recompute_counters, set_project_status};

const NO_PACKAGE_MATCH: &str = "no package match";
const INSUFFICIENT_CONFIG: &str = "insufficient configuration data";

fn default_true() -> bool {
    true
}

/// Request-level migration options. Per-app overrides on the application row
/// take precedence; a null override inherits these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MigrateOptions {
    #[serde(default = "default_true")]
    pub preserve_detection: bool,
    #[serde(default = "default_true")]
    pub preserve_install_commands: bool,
    #[serde(default)]
    pub use_winget_defaults: bool,
}

impl Default for MigrateOptions {
    fn default() -> Self {
        Self {
            preserve_detection: true,
            preserve_install_commands: true,
            use_winget_defaults: false,
        }
    }
}

impl MigrateOptions {
    fn effective_for(&self, app: &sccm_application::Model) -> MigrateOptions {
        MigrateOptions {
            preserve_detection: app.preserve_detection.unwrap_or(self.preserve_detection),
            preserve_install_commands: app
                .preserve_install_commands
                .unwrap_or(self.preserve_install_commands),
            use_winget_defaults: app.use_winget_defaults.unwrap_or(self.use_winget_defaults),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewItem {
    pub application_id: i32,
    pub name: String,
    pub winget_id: Option<String>,
    pub ready: bool,
    pub reason: Option<String>,
    pub warnings: Vec<String>,
    pub detection_source: Option<ConfigSource>,
    pub command_source: Option<ConfigSource>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewReport {
    pub total_apps: usize,
    pub migratable: usize,
    pub blocked: usize,
    pub items: Vec<PreviewItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecuteReport {
    pub total_attempted: usize,
    pub successful: usize,
    /// Construction failures (manifest fetch errors and the like).
    pub failed: usize,
    /// Requested apps that failed the can-migrate recheck: not linked,
    /// excluded, already processed, or unresolvable with the data at hand.
    pub skipped: usize,
    pub cart_item_ids: Vec<i32>,
    pub project_status: String,
}

struct ResolvedApp {
    payload: CartPayload,
    version: Option<String>,
    warnings: Vec<String>,
    detection_source: Option<ConfigSource>,
    command_source: Option<ConfigSource>,
}

enum Resolution {
    Ready(ResolvedApp),
    Blocked { reason: String, warnings: Vec<String> },
}

/// One requested application, looked up or not. Preview and execute walk the
/// same selection so a requested id is always accounted for exactly once.
enum Selected {
    App(sccm_application::Model),
    Missing(i32),
}

/// Dry run of the migration pipeline. Resolves every selected application the
/// same way execute would, but writes nothing. An empty `app_ids` selects the
/// whole project.
pub async fn preview(
    db: &DatabaseConnection,
    catalog: &dyn CatalogService,
    migration_id: i32,
    app_ids: &[i32],
    options: &MigrateOptions,
) -> Result<PreviewReport, DbErr> {
    let selection = select_apps(db, migration_id, app_ids).await?;

    let mut report = PreviewReport {
        total_apps: selection.len(),
        migratable: 0,
        blocked: 0,
        items: Vec::with_capacity(selection.len()),
    };

    for selected in &selection {
        let app = match selected {
            Selected::App(app) => app,
            Selected::Missing(id) => {
                report.blocked += 1;
                report.items.push(PreviewItem {
                    application_id: *id,
                    name: String::new(),
                    winget_id: None,
                    ready: false,
                    reason: Some(NO_PACKAGE_MATCH.to_string()),
                    warnings: vec![],
                    detection_source: None,
                    command_source: None,
                });
                continue;
            }
        };

        if let Some(reason) = not_migratable(app) {
            report.blocked += 1;
            report.items.push(blocked_item(app, reason, vec![]));
            continue;
        }

        let item = match resolve_app(catalog, app, options).await {
            Ok(Resolution::Ready(resolved)) => {
                report.migratable += 1;
                PreviewItem {
                    application_id: app.id,
                    name: app.name.clone(),
                    winget_id: app.matched_package_id.clone(),
                    ready: true,
                    reason: None,
                    warnings: resolved.warnings,
                    detection_source: resolved.detection_source,
                    command_source: resolved.command_source,
                }
            }
            Ok(Resolution::Blocked { reason, warnings }) => {
                report.blocked += 1;
                blocked_item(app, reason, warnings)
            }
            Err(err) => {
                report.blocked += 1;
                blocked_item(app, err.to_string(), vec![])
            }
        };
        report.items.push(item);
    }

    Ok(report)
}

/// Executes the migration over the selected apps: each one is re-resolved
/// from scratch (preview output is never trusted) and either lands in the
/// cart as `migrated`, is skipped because the can-migrate recheck failed, or
/// is marked `failed` on a construction error. Apps settle independently and
/// `successful + failed + skipped == total_attempted` holds on every return.
pub async fn execute(
    db: &DatabaseConnection,
    catalog: &dyn CatalogService,
    audit: &dyn AuditSink,
    identity: &Identity,
    migration_id: i32,
    app_ids: &[i32],
    options: &MigrateOptions,
) -> Result<ExecuteReport, DbErr> {
    let migration = sccm_migration::Entity::find_by_id(migration_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("sccm_migrations: {migration_id}")))?;

    let mut active = migration.into_active_model();
    active.status = Set(ProjectStatus::Migrating.as_str().to_string());
    active.last_migration_at = Set(Some(Utc::now()));
    active.updated_at = Set(Utc::now());
    active.update(db).await?;

    let selection = select_apps(db, migration_id, app_ids).await?;

    let mut report = ExecuteReport {
        total_attempted: selection.len(),
        successful: 0,
        failed: 0,
        skipped: 0,
        cart_item_ids: vec![],
        project_status: String::new(),
    };

    for selected in selection {
        let app = match selected {
            Selected::App(app) => app,
            Selected::Missing(_) => {
                report.skipped += 1;
                continue;
            }
        };

        if let Some(reason) = not_migratable(&app) {
            tracing::debug!(app_id = app.id, name = %app.name, %reason, "app skipped");
            report.skipped += 1;
            continue;
        }

        set_app_status(db, &app, MigrationStatus::InProgress).await?;

        match resolve_app(catalog, &app, options).await {
            Ok(Resolution::Ready(resolved)) => {
                let payload = serde_json::to_value(&resolved.payload)
                    .map_err(|err| DbErr::Json(err.to_string()))?;
                let winget_id = match &resolved.payload {
                    CartPayload::Win32 { winget_id, .. } => winget_id.clone(),
                    CartPayload::Store { store_product_id } => store_product_id.clone(),
                };

                let inserted = cart_item::ActiveModel {
                    migration_id: Set(Some(migration_id)),
                    application_id: Set(Some(app.id)),
                    user_id: Set(identity.user_id.clone()),
                    tenant_id: Set(identity.tenant_id.clone()),
                    winget_id: Set(winget_id),
                    display_name: Set(app.name.clone()),
                    version: Set(resolved.version),
                    payload: Set(payload),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(db)
                .await?;

                set_app_status(db, &app, MigrationStatus::Migrated).await?;
                report.cart_item_ids.push(inserted.id);
                report.successful += 1;
            }
            Ok(Resolution::Blocked { reason, .. }) => {
                // Failed the recheck, no side effects: the app stays pending
                // so a later call with better data can pick it up.
                tracing::warn!(app_id = app.id, name = %app.name, %reason, "migration skipped");
                set_app_status(db, &app, MigrationStatus::Pending).await?;
                report.skipped += 1;
            }
            Err(err) => {
                tracing::warn!(app_id = app.id, name = %app.name, %err, "migration failed");
                set_app_status(db, &app, MigrationStatus::Failed).await?;
                report.failed += 1;
            }
        }
    }

    let pending_left = sccm_application::Entity::find()
        .filter(sccm_application::Column::MigrationId.eq(migration_id))
        .filter(
            sccm_application::Column::MigrationStatus.eq(MigrationStatus::Pending.as_str()),
        )
        .count(db)
        .await?;

    let status = if pending_left == 0 {
        ProjectStatus::Completed
    } else {
        ProjectStatus::Ready
    };
    report.project_status = status.as_str().to_string();

    let migration = recompute_counters(db, migration_id).await?;
    set_project_status(db, migration, status).await?;

    if let Err(err) = audit
        .record(
            "migration.executed",
            json!({
                "migration_id": migration_id,
                "attempted": report.total_attempted,
                "successful": report.successful,
                "failed": report.failed,
                "skipped": report.skipped,
            }),
        )
        .await
    {
        tracing::warn!(%err, "audit sink rejected migration event");
    }

    Ok(report)
}

/// Resolves the requested app ids in request order, or the project's linked
/// applications when no explicit ids were given.
async fn select_apps(
    db: &DatabaseConnection,
    migration_id: i32,
    app_ids: &[i32],
) -> Result<Vec<Selected>, DbErr> {
    if app_ids.is_empty() {
        let apps = sccm_application::Entity::find()
            .filter(sccm_application::Column::MigrationId.eq(migration_id))
            .filter(sccm_application::Column::MatchStatus.is_in([
                MatchStatus::Matched.as_str(),
                MatchStatus::Manual.as_str(),
            ]))
            .filter(
                sccm_application::Column::MigrationStatus
                    .ne(MigrationStatus::Excluded.as_str()),
            )
            .order_by_asc(sccm_application::Column::Id)
            .all(db)
            .await?;
        return Ok(apps.into_iter().map(Selected::App).collect());
    }

    let mut by_id: HashMap<i32, sccm_application::Model> = sccm_application::Entity::find()
        .filter(sccm_application::Column::MigrationId.eq(migration_id))
        .filter(sccm_application::Column::Id.is_in(app_ids.iter().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(|app| (app.id, app))
        .collect();

    Ok(app_ids
        .iter()
        .map(|id| match by_id.remove(id) {
            Some(app) => Selected::App(app),
            None => Selected::Missing(*id),
        })
        .collect())
}

/// The can-migrate precondition: the app must carry a package link and must
/// not have been excluded or already processed.
fn not_migratable(app: &sccm_application::Model) -> Option<String> {
    let linked = app.match_status == MatchStatus::Matched.as_str()
        || app.match_status == MatchStatus::Manual.as_str();
    if !linked {
        return Some(NO_PACKAGE_MATCH.to_string());
    }
    if app.migration_status == MigrationStatus::Excluded.as_str() {
        return Some("application is excluded".to_string());
    }
    if app.migration_status != MigrationStatus::Pending.as_str() {
        return Some(format!("application is already {}", app.migration_status));
    }
    None
}

fn blocked_item(
    app: &sccm_application::Model,
    reason: String,
    warnings: Vec<String>,
) -> PreviewItem {
    PreviewItem {
        application_id: app.id,
        name: app.name.clone(),
        winget_id: app.matched_package_id.clone(),
        ready: false,
        reason: Some(reason),
        warnings,
        detection_source: None,
        command_source: None,
    }
}

async fn set_app_status(
    db: &DatabaseConnection,
    app: &sccm_application::Model,
    status: MigrationStatus,
) -> Result<(), DbErr> {
    let mut active = app.clone().into_active_model();
    active.migration_status = Set(status.as_str().to_string());
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(())
}

/// Microsoft Store product ids are 12-character alphanumeric tokens starting
/// with '9'; those packages deploy through the store path without installers.
fn is_store_package(winget_id: &str) -> bool {
    winget_id.len() == 12
        && winget_id.starts_with('9')
        && winget_id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Resolves one linked application into a cart payload. `Err` means the
/// catalog collaborator failed (transient); `Blocked` means this app cannot
/// produce a deployable item with the data at hand.
async fn resolve_app(
    catalog: &dyn CatalogService,
    app: &sccm_application::Model,
    options: &MigrateOptions,
) -> Result<Resolution, CatalogError> {
    let Some(winget_id) = app.matched_package_id.clone() else {
        return Ok(Resolution::Blocked {
            reason: NO_PACKAGE_MATCH.to_string(),
            warnings: vec![],
        });
    };

    if is_store_package(&winget_id) {
        return Ok(Resolution::Ready(ResolvedApp {
            payload: CartPayload::Store {
                store_product_id: winget_id,
            },
            version: None,
            warnings: vec![],
            detection_source: None,
            command_source: None,
        }));
    }

    let effective = options.effective_for(app);
    let mut warnings = Vec::new();

    let Some(manifest) = catalog.manifest(&winget_id, None).await? else {
        return Ok(Resolution::Blocked {
            reason: format!("no catalog manifest available for {winget_id}"),
            warnings,
        });
    };

    let (detection_rules, detection_source) =
        resolve_detection(app, &manifest, &effective, &mut warnings);
    let (install_command, uninstall_command, command_source) =
        resolve_commands(app, &manifest, &effective, &mut warnings);

    // A deployable item needs at least one way to verify or perform the
    // install.
    if detection_rules.is_empty() && install_command.is_none() {
        return Ok(Resolution::Blocked {
            reason: INSUFFICIENT_CONFIG.to_string(),
            warnings,
        });
    }

    Ok(Resolution::Ready(ResolvedApp {
        version: manifest.version.clone(),
        payload: CartPayload::Win32 {
            winget_id,
            version: manifest.version,
            install_command,
            uninstall_command,
            detection_rules,
            detection_source,
            command_source,
        },
        warnings,
        detection_source: Some(detection_source),
        command_source: Some(command_source),
    }))
}

fn preserved_detection(
    app: &sccm_application::Model,
    warnings: &mut Vec<String>,
) -> Option<Vec<DetectionRule>> {
    let value = app.detection_rules.clone()?;
    match serde_json::from_value::<Vec<DetectionRule>>(value) {
        Ok(rules) if !rules.is_empty() => Some(rules),
        Ok(_) => None,
        Err(err) => {
            warnings.push(format!("preserved detection rules could not be parsed: {err}"));
            None
        }
    }
}

/// Precedence: preserved SCCM rules, then catalog installer defaults when the
/// caller opted into them, then a synthesized fallback derived from whatever
/// installer metadata the manifest carries.
fn resolve_detection(
    app: &sccm_application::Model,
    manifest: &PackageManifest,
    effective: &MigrateOptions,
    warnings: &mut Vec<String>,
) -> (Vec<DetectionRule>, ConfigSource) {
    if effective.preserve_detection {
        if let Some(rules) = preserved_detection(app, warnings) {
            return (rules, ConfigSource::SccmPreserved);
        }
    }

    let winget_rules = manifest.default_detection_rules();

    if effective.use_winget_defaults && !winget_rules.is_empty() {
        return (winget_rules, ConfigSource::WingetDefault);
    }

    if winget_rules.is_empty() {
        warnings.push("no detection rules available from SCCM or the catalog".to_string());
    } else {
        warnings.push("detection rules were synthesized from installer metadata".to_string());
    }
    (winget_rules, ConfigSource::Synthesized)
}

/// Same precedence as detection: a preserved SCCM command wins, then explicit
/// manifest switches, then switches derived from the installer type.
fn resolve_commands(
    app: &sccm_application::Model,
    manifest: &PackageManifest,
    effective: &MigrateOptions,
    warnings: &mut Vec<String>,
) -> (Option<String>, Option<String>, ConfigSource) {
    if effective.preserve_install_commands {
        if let Some(command) = app.install_command.clone() {
            return (
                Some(command),
                app.uninstall_command.clone(),
                ConfigSource::SccmPreserved,
            );
        }
    }

    if let Some(installer) = manifest.preferred_installer() {
        if let Some(switches) = installer.silent_switches.clone() {
            return (Some(switches), None, ConfigSource::WingetDefault);
        }
        if let Some(switches) = silent_switches(None, installer.installer_type.as_deref()) {
            warnings.push("install command derived from the installer type".to_string());
            return (Some(switches), None, ConfigSource::Synthesized);
        }
    }

    warnings.push("no silent install command available".to_string());
    (None, None, ConfigSource::Synthesized)
}
