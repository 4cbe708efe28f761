use chrono::{DateTime, Utc};
use sea_orm::JsonValue;
use sea_orm::entity::prelude::*;

/// A packaging work record. `job_inputs` holds the assembled dispatch
/// descriptor; run_id/run_url arrive from the dispatch collaborator.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "packaging_jobs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: String,
    pub tenant_id: String,
    pub winget_id: String,
    pub display_name: String,
    pub publisher: Option<String>,
    pub version: String,
    /// pending/dispatched.
    pub status: String,
    pub update_check_id: Option<i32>,
    pub job_inputs: JsonValue,
    pub run_id: Option<String>,
    pub run_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::update_check::Entity",
        from = "Column::UpdateCheckId",
        to = "super::update_check::Column::Id"
    )]
    UpdateCheck,
}

impl Related<super::update_check::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UpdateCheck.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
