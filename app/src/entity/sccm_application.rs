use chrono::{DateTime, Utc};
use sea_orm::JsonValue;
use sea_orm::entity::prelude::*;

/// One application from the imported SCCM inventory.
///
/// Invariants maintained by the write paths:
/// - `matched_package_id` is set if and only if match_status is matched/manual;
/// - `match_candidates` is non-empty only when match_status is partial.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sccm_applications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub migration_id: i32,
    /// SCCM configuration item id from the source export.
    pub sccm_ci_id: Option<String>,
    pub name: String,
    pub manufacturer: Option<String>,
    pub version: Option<String>,
    /// Deployment technology tag from SCCM (MSI, Script, App-V, ...).
    pub technology: Option<String>,
    pub is_deployed: bool,
    /// Device-targeting count from SCCM.
    pub deployment_count: i32,
    pub match_status: String,
    /// Matching confidence in [0, 1]; null until the first match run.
    pub match_confidence: Option<f64>,
    pub matched_package_id: Option<String>,
    pub matched_package_name: Option<String>,
    /// Ordered partial-match candidates: [{package_id, package_name, confidence}].
    pub match_candidates: Option<JsonValue>,
    /// Preserved SCCM detection rules (structured list).
    pub detection_rules: Option<JsonValue>,
    pub install_command: Option<String>,
    pub uninstall_command: Option<String>,
    pub install_behavior: Option<String>,
    /// Per-app overrides; null inherits the request-level migrate options.
    pub preserve_detection: Option<bool>,
    pub preserve_install_commands: Option<bool>,
    pub use_winget_defaults: Option<bool>,
    pub migration_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
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
