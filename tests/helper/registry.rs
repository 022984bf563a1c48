//! Registry test utilities

use std::collections::HashMap;

use async_trait::async_trait;

use version_matrix::version::error::RegistryError;
use version_matrix::version::registry::Registry;

/// In-memory registry; versions are returned in the order given
#[derive(Default)]
pub struct MockRegistry {
    versions: HashMap<String, Vec<String>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_versions(mut self, package: &str, versions: Vec<&str>) -> Self {
        self.versions.insert(
            package.to_string(),
            versions.into_iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    /// Whether `name@version` was ever published
    pub fn is_published(&self, name: &str, version: &str) -> bool {
        self.versions
            .get(name)
            .is_some_and(|versions| versions.iter().any(|v| v == version))
    }
}

#[async_trait]
impl Registry for MockRegistry {
    async fn fetch_all_versions(&self, package_name: &str) -> Result<Vec<String>, RegistryError> {
        match self.versions.get(package_name) {
            Some(versions) => Ok(versions.clone()),
            None => Err(RegistryError::NotFound(package_name.to_string())),
        }
    }
}
