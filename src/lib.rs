//! Technical lag of the dependencies listed in an SBOM
//!
//! # Modules
//!
//! - [`config`]: Analysis settings and their config file
//! - [`lag`]: Lag calculation, scope aggregation and hot-path analysis
//! - [`logging`]: Tracing subscriber setup
//! - [`sbom`]: CycloneDX manifest model and dependency graph
//! - [`version`]: Release histories and version distance metrics

pub mod config;
pub mod lag;
pub mod logging;
pub mod sbom;
pub mod version;
