use thiserror::Error;

/// Failures of the version distance engine
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DistanceError {
    #[error("no versions provided")]
    EmptyInput,

    #[error("invalid version: {0}")]
    InvalidVersion(String),

    #[error("no valid, non-prerelease versions found ({skipped} skipped)")]
    NoValidVersions { skipped: usize },

    #[error("used version {0} not found among valid versions")]
    VersionNotFound(String),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid package URL {purl}: {reason}")]
    InvalidPurl { purl: String, reason: String },

    #[error("Unsupported package type: {0}")]
    UnsupportedPackageType(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<String> },

    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unexpected HTTP status {status}: {url}")]
    Http { status: u16, url: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}
