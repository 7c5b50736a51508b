//! deps.dev API implementation

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{DEFAULT_REGISTRY_URL, FETCH_TIMEOUT_MS};
use crate::version::error::RegistryError;
use crate::version::purl::RegistryCoordinates;
use crate::version::registry::VersionRegistry;
use crate::version::types::VersionRecord;

/// Response from `GET /systems/{system}/packages/{name}`
#[derive(Debug, Deserialize)]
struct PackageResponse {
    #[serde(default)]
    versions: Vec<VersionEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionEntry {
    version_key: VersionKey,
    #[serde(default)]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionKey {
    #[serde(default)]
    version: String,
    // Older payloads carried the timestamp inside the key.
    #[serde(default)]
    published_at: Option<String>,
}

impl From<VersionEntry> for VersionRecord {
    fn from(entry: VersionEntry) -> Self {
        let non_empty = |ts: Option<String>| ts.filter(|s| !s.is_empty());
        let published_at =
            non_empty(entry.published_at).or_else(|| non_empty(entry.version_key.published_at));

        VersionRecord {
            version: entry.version_key.version,
            published_at,
        }
    }
}

/// Registry implementation for the deps.dev v3 API
pub struct DepsDevRegistry {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl DepsDevRegistry {
    /// Creates a new DepsDevRegistry with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_millis(FETCH_TIMEOUT_MS))
    }

    /// Creates a new DepsDevRegistry whose requests give up after `timeout`
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("techlag/", env!("CARGO_PKG_VERSION")))
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn transport_error(&self, error: reqwest::Error) -> RegistryError {
        if error.is_timeout() {
            RegistryError::Timeout(self.timeout.as_millis() as u64)
        } else {
            RegistryError::Network(error)
        }
    }
}

impl Default for DepsDevRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_URL)
    }
}

#[async_trait::async_trait]
impl VersionRegistry for DepsDevRegistry {
    async fn fetch_versions(&self, purl: &str) -> Result<Vec<VersionRecord>, RegistryError> {
        let coordinates = RegistryCoordinates::from_purl(purl)?;
        let url = format!(
            "{}/systems/{}/packages/{}",
            self.base_url, coordinates.system, coordinates.name
        );
        debug!("Querying deps.dev for {}: {}", purl, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            debug!("Rate limited by deps.dev (retry after {:?}): {}", retry_after, url);
            return Err(RegistryError::RateLimited { retry_after });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(purl.to_string()));
        }

        if status == reqwest::StatusCode::BAD_REQUEST {
            return Err(RegistryError::BadRequest(url));
        }

        if !status.is_success() {
            warn!("deps.dev returned status {}: {}", status, url);
            return Err(RegistryError::Http {
                status: status.as_u16(),
                url,
            });
        }

        let package: PackageResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                return self.transport_error(e);
            }
            warn!("Failed to parse deps.dev response: {}", e);
            RegistryError::Decode(e.to_string())
        })?;

        let versions: Vec<VersionRecord> =
            package.versions.into_iter().map(VersionRecord::from).collect();
        debug!("Retrieved {} versions for {}", versions.len(), purl);

        Ok(versions)
    }
}
