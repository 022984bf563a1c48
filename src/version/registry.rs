//! Registry trait for fetching the published versions of a package

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;

/// Trait for fetching package versions from a registry
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Fetches all published versions for a package
    ///
    /// # Arguments
    /// * `package_name` - The name of the package (e.g., "express", "@types/node")
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Versions ordered from oldest to newest
    /// * `Err(RegistryError)` - If the fetch fails
    async fn fetch_all_versions(&self, package_name: &str) -> Result<Vec<String>, RegistryError>;
}
