//! Registry trait for fetching a package's release history

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;
use crate::version::types::VersionRecord;

/// Trait for fetching known versions of a package from a version registry
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait VersionRegistry: Send + Sync {
    /// Fetches all known versions for a package
    ///
    /// # Arguments
    /// * `purl` - Package URL identifying the package (e.g., "pkg:npm/lodash@4.17.21")
    ///
    /// # Returns
    /// * `Ok(Vec<VersionRecord>)` - Versions with optional publish timestamps, in registry order
    /// * `Err(RegistryError)` - If the package type is unsupported or the fetch fails
    async fn fetch_versions(&self, purl: &str) -> Result<Vec<VersionRecord>, RegistryError>;
}
