use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::CatalogConfig;

use super::{CandidatePackage, CatalogError, CatalogService, Installer, PackageManifest};

/// HTTP client for the Winget catalog/manifest collaborator.
pub struct WingetCatalog {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    packages: Vec<SearchPackage>,
}

#[derive(Debug, Deserialize)]
struct SearchPackage {
    id: String,
    name: String,
    publisher: Option<String>,
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ManifestResponse {
    package_id: String,
    version: Option<String>,
    #[serde(default)]
    installers: Vec<ManifestInstaller>,
}

#[derive(Debug, Deserialize)]
struct ManifestInstaller {
    architecture: Option<String>,
    installer_type: Option<String>,
    url: String,
    sha256: Option<String>,
    silent_switches: Option<String>,
    product_code: Option<String>,
}

impl WingetCatalog {
    pub fn from_config(config: &CatalogConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds()))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CatalogService for WingetCatalog {
    async fn search(&self, query: &str) -> Result<Vec<CandidatePackage>, CatalogError> {
        let endpoint = format!("{}/packages/search", self.base_url);

        let response = self
            .client
            .get(endpoint)
            .query(&[("query", query)])
            .send()
            .await
            .map_err(|err| CatalogError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(CatalogError::Unavailable(format!(
                "search returned {}",
                response.status()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|err| CatalogError::Malformed(err.to_string()))?;

        Ok(body
            .packages
            .into_iter()
            .map(|pkg| CandidatePackage {
                id: pkg.id,
                name: pkg.name,
                publisher: pkg.publisher,
                version: pkg.version,
            })
            .collect())
    }

    async fn manifest(
        &self,
        package_id: &str,
        version: Option<&str>,
    ) -> Result<Option<PackageManifest>, CatalogError> {
        let endpoint = format!("{}/packages/{}/manifest", self.base_url, package_id);

        let mut request = self.client.get(endpoint);
        if let Some(version) = version {
            request = request.query(&[("version", version)]);
        }

        let response = request
            .send()
            .await
            .map_err(|err| CatalogError::Unavailable(err.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(CatalogError::Unavailable(format!(
                "manifest returned {}",
                response.status()
            )));
        }

        let body: ManifestResponse = response
            .json()
            .await
            .map_err(|err| CatalogError::Malformed(err.to_string()))?;

        Ok(Some(PackageManifest {
            package_id: body.package_id,
            version: body.version,
            installers: body
                .installers
                .into_iter()
                .map(|installer| Installer {
                    architecture: installer.architecture,
                    installer_type: installer.installer_type,
                    url: installer.url,
                    sha256: installer.sha256,
                    silent_switches: installer.silent_switches,
                    product_code: installer.product_code,
                })
                .collect(),
        }))
    }
}
