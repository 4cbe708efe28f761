use axum::{Extension, extract::State};
use chrono::Utc;
use sea_orm::ActiveModelTrait;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    app::AppState,
    auth::Identity,
    common::{ApiResponse, ApiResult},
    deployment::DetectionRule,
    entity::{
        sccm_application, sccm_migration,
        status::{MatchStatus, MigrationStatus, ProjectStatus},
    },
    migrate::recompute_counters,
    params::{Json, Valid},
};

#[derive(Debug, Deserialize, Validate)]
pub struct ImportMigration {
    #[validate(length(min = 1, max = 120, message = "name must be 1-120 characters"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "at least one application is required"))]
    #[validate(nested)]
    pub applications: Vec<ImportApplication>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ImportApplication {
    #[validate(length(min = 1, message = "application name is required"))]
    pub name: String,
    pub sccm_ci_id: Option<String>,
    pub manufacturer: Option<String>,
    pub version: Option<String>,
    pub technology: Option<String>,
    #[serde(default)]
    pub is_deployed: bool,
    #[serde(default)]
    pub deployment_count: i32,
    pub detection_rules: Option<Vec<DetectionRule>>,
    pub install_command: Option<String>,
    pub uninstall_command: Option<String>,
    pub install_behavior: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub migration_id: i32,
    pub total_apps: i32,
    pub status: String,
}

/// Creates a migration project from an SCCM inventory export. Every imported
/// application starts out pending on both axes; matching is a separate call.
#[axum::debug_handler]
pub async fn import_migration(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Valid(Json(payload)): Valid<Json<ImportMigration>>,
) -> ApiResult<ApiResponse<ImportResponse>> {
    let now = Utc::now();

    let migration = sccm_migration::ActiveModel {
        name: Set(payload.name.clone()),
        description: Set(payload.description.clone()),
        user_id: Set(identity.user_id.clone()),
        tenant_id: Set(identity.tenant_id.clone()),
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
    .insert(&state.db)
    .await?;

    for app in &payload.applications {
        let detection_rules = app
            .detection_rules
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(anyhow::Error::from)?;

        sccm_application::ActiveModel {
            migration_id: Set(migration.id),
            sccm_ci_id: Set(app.sccm_ci_id.clone()),
            name: Set(app.name.clone()),
            manufacturer: Set(app.manufacturer.clone()),
            version: Set(app.version.clone()),
            technology: Set(app.technology.clone()),
            is_deployed: Set(app.is_deployed),
            deployment_count: Set(app.deployment_count),
            match_status: Set(MatchStatus::Pending.as_str().to_string()),
            match_confidence: Set(None),
            matched_package_id: Set(None),
            matched_package_name: Set(None),
            match_candidates: Set(None),
            detection_rules: Set(detection_rules),
            install_command: Set(app.install_command.clone()),
            uninstall_command: Set(app.uninstall_command.clone()),
            install_behavior: Set(app.install_behavior.clone()),
            preserve_detection: Set(None),
            preserve_install_commands: Set(None),
            use_winget_defaults: Set(None),
            migration_status: Set(MigrationStatus::Pending.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&state.db)
        .await?;
    }

    let migration = recompute_counters(&state.db, migration.id).await?;

    Ok(ApiResponse::ok(
        "migration imported",
        Some(ImportResponse {
            migration_id: migration.id,
            total_apps: migration.total_apps,
            status: migration.status,
        }),
    ))
}
