use chrono::{DateTime, Utc};
use sea_orm::JsonValue;
use sea_orm::entity::prelude::*;

/// Update handling policy for one (user, tenant, winget id).
/// `deployment_config` is always present once the row exists: either
/// user-authored or derived once from the most recent successful deployment.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "update_policies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: String,
    pub tenant_id: String,
    pub winget_id: String,
    /// auto_update/notify/ignore/pin_version.
    pub policy_type: String,
    pub is_enabled: bool,
    pub deployment_config: JsonValue,
    pub consecutive_failures: i32,
    pub last_auto_update_at: Option<DateTime<Utc>>,
    /// Upload-history row the deployment_config was derived from, if any.
    pub upload_history_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
