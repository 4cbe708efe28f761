use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// Recorded update signal for one (user, tenant, winget id). Written by the
/// update-check scanner; read by the trigger orchestrator.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "update_checks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: String,
    pub tenant_id: String,
    pub winget_id: String,
    /// Version currently deployed, when known.
    pub current_version: Option<String>,
    pub latest_version: String,
    pub detected_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::packaging_job::Entity")]
    PackagingJob,
}

impl Related<super::packaging_job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PackagingJob.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
