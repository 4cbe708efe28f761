use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Per-app match classification. Stored as a plain string column; the write
/// paths only ever persist values produced by `as_str`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Matched,
    Partial,
    Unmatched,
    Manual,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Matched => "matched",
            MatchStatus::Partial => "partial",
            MatchStatus::Unmatched => "unmatched",
            MatchStatus::Manual => "manual",
        }
    }

    /// Statuses that carry a linked package and are eligible for migration.
    pub fn is_linked(&self) -> bool {
        matches!(self, MatchStatus::Matched | MatchStatus::Manual)
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(MatchStatus::Pending),
            "matched" => Ok(MatchStatus::Matched),
            "partial" => Ok(MatchStatus::Partial),
            "unmatched" => Ok(MatchStatus::Unmatched),
            "manual" => Ok(MatchStatus::Manual),
            other => Err(format!("unknown match status: {other}")),
        }
    }
}

impl Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-app migration execution status, independent from the match status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    Pending,
    InProgress,
    Migrated,
    Failed,
    Excluded,
}

impl MigrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationStatus::Pending => "pending",
            MigrationStatus::InProgress => "in_progress",
            MigrationStatus::Migrated => "migrated",
            MigrationStatus::Failed => "failed",
            MigrationStatus::Excluded => "excluded",
        }
    }
}

impl FromStr for MigrationStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(MigrationStatus::Pending),
            "in_progress" => Ok(MigrationStatus::InProgress),
            "migrated" => Ok(MigrationStatus::Migrated),
            "failed" => Ok(MigrationStatus::Failed),
            "excluded" => Ok(MigrationStatus::Excluded),
            other => Err(format!("unknown migration status: {other}")),
        }
    }
}

impl Display for MigrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project lifecycle. "error" is reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Importing,
    Matching,
    Ready,
    Migrating,
    Completed,
    Error,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Importing => "importing",
            ProjectStatus::Matching => "matching",
            ProjectStatus::Ready => "ready",
            ProjectStatus::Migrating => "migrating",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Error => "error",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "importing" => Ok(ProjectStatus::Importing),
            "matching" => Ok(ProjectStatus::Matching),
            "ready" => Ok(ProjectStatus::Ready),
            "migrating" => Ok(ProjectStatus::Migrating),
            "completed" => Ok(ProjectStatus::Completed),
            "error" => Ok(ProjectStatus::Error),
            other => Err(format!("unknown project status: {other}")),
        }
    }
}

impl Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    AutoUpdate,
    Notify,
    Ignore,
    PinVersion,
}

impl PolicyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyType::AutoUpdate => "auto_update",
            PolicyType::Notify => "notify",
            PolicyType::Ignore => "ignore",
            PolicyType::PinVersion => "pin_version",
        }
    }
}

impl FromStr for PolicyType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "auto_update" => Ok(PolicyType::AutoUpdate),
            "notify" => Ok(PolicyType::Notify),
            "ignore" => Ok(PolicyType::Ignore),
            "pin_version" => Ok(PolicyType::PinVersion),
            other => Err(format!("unknown policy type: {other}")),
        }
    }
}

impl Display for PolicyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
