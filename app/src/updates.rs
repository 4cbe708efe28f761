pub mod policy;
pub mod trigger;

pub use policy::{ensure_policy, with_escalated_policy};
pub use trigger::{TriggerItemResult, TriggerReport, TriggerTarget, trigger_updates};
