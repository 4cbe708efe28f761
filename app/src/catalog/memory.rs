use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;

use super::{CandidatePackage, CatalogError, CatalogService, PackageManifest};

/// Token-indexed in-memory catalog. Used by the test suite and by local
/// development without a catalog collaborator; search is an index lookup,
/// never a scan over the full package list.
#[derive(Default)]
pub struct InMemoryCatalog {
    packages: Vec<CandidatePackage>,
    manifests: HashMap<String, PackageManifest>,
    token_index: HashMap<String, BTreeSet<usize>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_packages(packages: Vec<CandidatePackage>) -> Self {
        let mut catalog = Self::new();
        for package in packages {
            catalog.insert(package);
        }
        catalog
    }

    pub fn insert(&mut self, package: CandidatePackage) {
        let index = self.packages.len();

        for token in tokenize(&package.id).chain(tokenize(&package.name)) {
            self.token_index.entry(token).or_default().insert(index);
        }

        self.packages.push(package);
    }

    pub fn insert_manifest(&mut self, manifest: PackageManifest) {
        self.manifests.insert(manifest.package_id.clone(), manifest);
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_ascii_lowercase())
}

#[async_trait]
impl CatalogService for InMemoryCatalog {
    async fn search(&self, query: &str) -> Result<Vec<CandidatePackage>, CatalogError> {
        let mut hits: BTreeSet<usize> = BTreeSet::new();

        for token in tokenize(query) {
            if let Some(indices) = self.token_index.get(&token) {
                hits.extend(indices.iter().copied());
            }
        }

        Ok(hits
            .into_iter()
            .map(|index| self.packages[index].clone())
            .collect())
    }

    async fn manifest(
        &self,
        package_id: &str,
        _version: Option<&str>,
    ) -> Result<Option<PackageManifest>, CatalogError> {
        Ok(self.manifests.get(package_id).cloned())
    }
}
