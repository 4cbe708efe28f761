use chrono::{DateTime, Utc};
use sea_orm::JsonValue;
use sea_orm::entity::prelude::*;

/// A resolved, ready-to-submit deployment descriptor produced by execute.
/// `payload` is the tagged Win32/Store union from `crate::deployment`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cart_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub migration_id: Option<i32>,
    pub application_id: Option<i32>,
    pub user_id: String,
    pub tenant_id: String,
    pub winget_id: String,
    pub display_name: String,
    pub version: Option<String>,
    pub payload: JsonValue,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sccm_migration::Entity",
        from = "Column::MigrationId",
        to = "super::sccm_migration::Column::Id"
    )]
    SccmMigration,
}

impl Related<super::sccm_migration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SccmMigration.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
