pub mod cart_item;
pub mod packaging_job;
pub mod sccm_application;
pub mod sccm_migration;
pub mod status;
pub mod update_check;
pub mod update_policy;
pub mod upload_history;
