use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// A migration project: one imported SCCM application inventory batch.
/// The aggregate counters are a cache recomputed from the child rows after
/// every mutation, never patched incrementally.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sccm_migrations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub user_id: String,
    pub tenant_id: String,
    /// Lifecycle: importing/matching/ready/migrating/completed/error.
    pub status: String,
    pub total_apps: i32,
    /// Apps with match status matched or manual.
    pub matched_apps: i32,
    pub partial_match_apps: i32,
    pub unmatched_apps: i32,
    pub migrated_apps: i32,
    pub failed_apps: i32,
    /// Set on every execute call.
    pub last_migration_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sccm_application::Entity")]
    SccmApplication,
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItem,
}

impl Related<super::sccm_application::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SccmApplication.def()
    }
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
