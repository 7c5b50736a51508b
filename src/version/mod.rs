//! Version layer: release history retrieval and lag metrics
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    PURL     │────▶│  Registry   │────▶│  Distance   │
//! │  (address)  │     │  (fetch)    │     │  (metrics)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │                   │
//!                            ▼                   ▼
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │ Registries  │     │   Semver    │
//!                     │ (deps.dev)  │     │  (relaxed)  │
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`distance`]: release-count and elapsed-time lag between versions
//! - [`error`]: Error types for distance and registry operations
//! - [`purl`]: Package URL parsing and registry system mapping
//! - [`registry`]: Registry trait for fetching release histories
//! - [`registries`]: Concrete registry implementations (deps.dev)
//! - [`semver`]: Relaxed version parsing and ordering
//! - [`types`]: Common types like `VersionRecord` and `VersionDistance`

pub mod distance;
pub mod error;
pub mod purl;
pub mod registries;
pub mod registry;
pub mod semver;
pub mod types;
