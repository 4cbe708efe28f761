use chrono::{DateTime, Utc};
use sea_orm::JsonValue;
use sea_orm::entity::prelude::*;

/// One packaging/deployment attempt. Successful rows carry the deployment
/// config used, which the trigger path mines when no policy exists yet.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "upload_histories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: String,
    pub tenant_id: String,
    pub winget_id: String,
    pub display_name: Option<String>,
    pub version: Option<String>,
    /// success/failed.
    pub status: String,
    pub deployment_config: Option<JsonValue>,
    pub packaging_job_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
