//! Dependency manifest model and graph queries
//!
//! # Modules
//!
//! - [`types`]: `Component`, `DependencyEdge`, `Manifest` and scope classification
//! - [`cyclonedx`]: CycloneDX JSON decoding into a `Manifest`
//! - [`graph`]: `DependencyGraph` for direct-dependency and shortest-path queries

pub mod cyclonedx;
pub mod graph;
pub mod types;
