use axum::{Extension, extract::State};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    app::AppState,
    auth::Identity,
    common::{ApiError, ApiResponse, ApiResult},
    config,
    entity::sccm_application,
    migrate::{self, ExecuteReport, MigrateOptions, PreviewReport, run_matching},
    params::{Json, Query, Valid},
};

use super::{ApplicationDetail, find_owned_migration};

#[derive(Debug, Deserialize, Validate)]
pub struct MatchPayload {
    #[validate(range(min = 1))]
    pub migration_id: i32,
    #[serde(default)]
    pub force_rematch: bool,
}

#[derive(Debug, Serialize)]
pub struct MatchStarted {
    pub migration_id: i32,
    pub status: &'static str,
}

/// Kicks off the matching run in the background and returns immediately.
/// Callers follow progress through the project counters on `GET /{id}`.
#[axum::debug_handler]
pub async fn run_match(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Valid(Json(payload)): Valid<Json<MatchPayload>>,
) -> ApiResult<ApiResponse<MatchStarted>> {
    find_owned_migration(&state.db, &identity, payload.migration_id).await?;

    let db = state.db.clone();
    let catalog = state.catalog.clone();
    let matching = config::get().matching();
    let migration_id = payload.migration_id;
    let force_rematch = payload.force_rematch;
    tokio::spawn(async move {
        if let Err(err) = run_matching(&db, &catalog, migration_id, force_rematch, matching).await {
            tracing::error!(migration_id, error = %err, "matching run failed");
        }
    });

    Ok(ApiResponse::ok(
        "matching started",
        Some(MatchStarted {
            migration_id,
            status: "matching",
        }),
    ))
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdjustAction {
    Link,
    Exclude,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdjustPayload {
    #[validate(range(min = 1))]
    pub application_id: i32,
    pub action: AdjustAction,
    pub package_id: Option<String>,
    pub package_name: Option<String>,
}

/// Manual override: link an application to an operator-chosen package or
/// exclude it from migration.
#[axum::debug_handler]
pub async fn adjust_match(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Valid(Json(payload)): Valid<Json<AdjustPayload>>,
) -> ApiResult<ApiResponse<ApplicationDetail>> {
    let app = sccm_application::Entity::find_by_id(payload.application_id)
        .one(&state.db)
        .await?
        .ok_or(ApiError::NotFound)?;

    find_owned_migration(&state.db, &identity, app.migration_id).await?;

    let updated = match payload.action {
        AdjustAction::Link => {
            let (Some(package_id), Some(package_name)) =
                (payload.package_id, payload.package_name)
            else {
                return Err(ApiError::Validation(
                    "package_id and package_name are required to link".to_string(),
                ));
            };
            migrate::link_manual(&state.db, app, package_id, package_name).await?
        }
        AdjustAction::Exclude => migrate::exclude(&state.db, app).await?,
    };

    Ok(ApiResponse::ok("application updated", Some(updated.into())))
}

#[derive(Debug, Deserialize, Validate)]
pub struct MigratePayload {
    #[validate(range(min = 1))]
    pub migration_id: i32,
    /// Apps to migrate, in request order. Empty selects the whole project.
    #[serde(default)]
    pub app_ids: Vec<i32>,
    #[serde(default)]
    pub options: MigrateOptions,
}

#[derive(Debug, Deserialize)]
pub struct MigrateParams {
    pub action: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MigrateOutcome {
    Preview(PreviewReport),
    Execute(ExecuteReport),
}

/// Runs the migration pipeline. `?action=preview` is a dry run;
/// `?action=execute` resolves the apps into cart items.
#[axum::debug_handler]
pub async fn migrate(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<MigrateParams>,
    Valid(Json(payload)): Valid<Json<MigratePayload>>,
) -> ApiResult<ApiResponse<MigrateOutcome>> {
    find_owned_migration(&state.db, &identity, payload.migration_id).await?;

    match params.action.as_str() {
        "preview" => {
            let report = migrate::preview(
                &state.db,
                state.catalog.as_ref(),
                payload.migration_id,
                &payload.app_ids,
                &payload.options,
            )
            .await?;
            Ok(ApiResponse::ok(
                "migration preview",
                Some(MigrateOutcome::Preview(report)),
            ))
        }
        "execute" => {
            let report = migrate::execute(
                &state.db,
                state.catalog.as_ref(),
                state.audit.as_ref(),
                &identity,
                payload.migration_id,
                &payload.app_ids,
                &payload.options,
            )
            .await?;
            Ok(ApiResponse::ok(
                "migration executed",
                Some(MigrateOutcome::Execute(report)),
            ))
        }
        other => Err(ApiError::Validation(format!(
            "action must be preview or execute, got {other}"
        ))),
    }
}
