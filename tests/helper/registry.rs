//! Registry test utilities

use std::collections::HashMap;

use async_trait::async_trait;

use techlag::version::error::RegistryError;
use techlag::version::registry::VersionRegistry;
use techlag::version::types::VersionRecord;

/// In-memory registry keyed by package URL.
/// Unknown package URLs answer with `NotFound`.
#[derive(Default)]
pub struct StaticRegistry {
    histories: HashMap<String, Vec<VersionRecord>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `(version, published_at)` pairs for `purl`.
    pub fn with_history(mut self, purl: &str, history: &[(&str, &str)]) -> Self {
        self.histories.insert(
            purl.to_string(),
            history
                .iter()
                .map(|(version, published_at)| VersionRecord::new(*version, Some(*published_at)))
                .collect(),
        );
        self
    }
}

#[async_trait]
impl VersionRegistry for StaticRegistry {
    async fn fetch_versions(&self, purl: &str) -> Result<Vec<VersionRecord>, RegistryError> {
        self.histories
            .get(purl)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(purl.to_string()))
    }
}
