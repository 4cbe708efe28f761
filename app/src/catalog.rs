pub mod memory;
pub mod winget;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::deployment::DetectionRule;

pub use memory::InMemoryCatalog;
pub use winget::WingetCatalog;

/// A package as returned by the catalog's name-similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePackage {
    pub id: String,
    pub name: String,
    pub publisher: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installer {
    pub architecture: Option<String>,
    pub installer_type: Option<String>,
    pub url: String,
    pub sha256: Option<String>,
    pub silent_switches: Option<String>,
    pub product_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub package_id: String,
    pub version: Option<String>,
    pub installers: Vec<Installer>,
}

impl PackageManifest {
    /// Installer-derived detection rules: one MSI rule per product code.
    pub fn default_detection_rules(&self) -> Vec<DetectionRule> {
        self.installers
            .iter()
            .filter_map(|installer| installer.product_code.as_ref())
            .map(|code| DetectionRule::Msi {
                product_code: code.clone(),
            })
            .collect()
    }

    /// Preferred installer: first x64, else the first listed.
    pub fn preferred_installer(&self) -> Option<&Installer> {
        self.installers
            .iter()
            .find(|installer| {
                installer
                    .architecture
                    .as_deref()
                    .is_some_and(|arch| arch.eq_ignore_ascii_case("x64"))
            })
            .or_else(|| self.installers.first())
    }
}

/// Infrastructure failures only. "Package not found" is a normal outcome
/// (`Ok(None)` / empty search result), never an error; the batch orchestrator
/// treats these variants as transient and retries instead of recording
/// "unmatched".
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    #[error("catalog response malformed: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Indexed name-similarity search seeded by the query string.
    async fn search(&self, query: &str) -> Result<Vec<CandidatePackage>, CatalogError>;

    /// Manifest lookup for a known package id.
    async fn manifest(
        &self,
        package_id: &str,
        version: Option<&str>,
    ) -> Result<Option<PackageManifest>, CatalogError>;
}
