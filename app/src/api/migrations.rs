use axum::{
    Extension,
    Router,
    extract::State,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use serde::Serialize;
use serde_json::Value;

use crate::{
    app::AppState,
    auth::Identity,
    common::{ApiError, ApiResponse, ApiResult},
    entity::{cart_item, sccm_application, sccm_migration},
    params::{Page, PaginationParams, Path, Query, Valid},
};

pub mod import;
pub mod migrate;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_migrations).post(import::import_migration))
        .route("/{id}", get(get_migration).delete(delete_migration))
        .route(
            "/match",
            post(migrate::run_match).patch(migrate::adjust_match),
        )
        .route("/migrate", post(migrate::migrate))
}

#[derive(Debug, Serialize)]
pub struct MigrationSummary {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub total_apps: i32,
    pub matched_apps: i32,
    pub partial_match_apps: i32,
    pub unmatched_apps: i32,
    pub migrated_apps: i32,
    pub failed_apps: i32,
    pub last_migration_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<sccm_migration::Model> for MigrationSummary {
    fn from(model: sccm_migration::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            status: model.status,
            total_apps: model.total_apps,
            matched_apps: model.matched_apps,
            partial_match_apps: model.partial_match_apps,
            unmatched_apps: model.unmatched_apps,
            migrated_apps: model.migrated_apps,
            failed_apps: model.failed_apps,
            last_migration_at: model.last_migration_at,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApplicationDetail {
    pub id: i32,
    pub name: String,
    pub manufacturer: Option<String>,
    pub version: Option<String>,
    pub technology: Option<String>,
    pub is_deployed: bool,
    pub deployment_count: i32,
    pub match_status: String,
    pub match_confidence: Option<f64>,
    pub matched_package_id: Option<String>,
    pub matched_package_name: Option<String>,
    pub match_candidates: Option<Value>,
    pub migration_status: String,
}

impl From<sccm_application::Model> for ApplicationDetail {
    fn from(model: sccm_application::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            manufacturer: model.manufacturer,
            version: model.version,
            technology: model.technology,
            is_deployed: model.is_deployed,
            deployment_count: model.deployment_count,
            match_status: model.match_status,
            match_confidence: model.match_confidence,
            matched_package_id: model.matched_package_id,
            matched_package_name: model.matched_package_name,
            match_candidates: model.match_candidates,
            migration_status: model.migration_status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MigrationDetail {
    #[serde(flatten)]
    pub migration: MigrationSummary,
    pub applications: Vec<ApplicationDetail>,
}

/// Loads a migration project and verifies it belongs to the caller. A foreign
/// project is indistinguishable from a missing one.
pub(crate) async fn find_owned_migration(
    db: &DatabaseConnection,
    identity: &Identity,
    migration_id: i32,
) -> ApiResult<sccm_migration::Model> {
    sccm_migration::Entity::find_by_id(migration_id)
        .filter(sccm_migration::Column::UserId.eq(identity.user_id.as_str()))
        .filter(sccm_migration::Column::TenantId.eq(identity.tenant_id.as_str()))
        .one(db)
        .await?
        .ok_or(ApiError::NotFound)
}

async fn list_migrations(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Valid(Query(pagination)): Valid<Query<PaginationParams>>,
) -> ApiResult<ApiResponse<Page<MigrationSummary>>> {
    let paginator = sccm_migration::Entity::find()
        .filter(sccm_migration::Column::UserId.eq(identity.user_id.as_str()))
        .filter(sccm_migration::Column::TenantId.eq(identity.tenant_id.as_str()))
        .order_by_desc(sccm_migration::Column::CreatedAt)
        .paginate(&state.db, pagination.per_page);

    let total = paginator.num_items().await?;
    let items = paginator
        .fetch_page(pagination.page - 1)
        .await?
        .into_iter()
        .map(MigrationSummary::from)
        .collect();

    Ok(ApiResponse::ok(
        "migration projects",
        Some(Page::from_pagination(pagination, total, items)),
    ))
}

async fn get_migration(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
) -> ApiResult<ApiResponse<MigrationDetail>> {
    let migration = find_owned_migration(&state.db, &identity, id).await?;

    let applications = migration
        .find_related(sccm_application::Entity)
        .order_by_asc(sccm_application::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(ApplicationDetail::from)
        .collect();

    Ok(ApiResponse::ok(
        "migration project",
        Some(MigrationDetail {
            migration: migration.into(),
            applications,
        }),
    ))
}

async fn delete_migration(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
) -> ApiResult<ApiResponse<i32>> {
    let migration = find_owned_migration(&state.db, &identity, id).await?;

    cart_item::Entity::delete_many()
        .filter(cart_item::Column::MigrationId.eq(migration.id))
        .exec(&state.db)
        .await?;
    sccm_application::Entity::delete_many()
        .filter(sccm_application::Column::MigrationId.eq(migration.id))
        .exec(&state.db)
        .await?;

    let deleted_id = migration.id;
    migration.delete(&state.db).await?;

    Ok(ApiResponse::ok("migration project deleted", Some(deleted_id)))
}
