//! Shared test utilities

pub mod registry;
pub mod sbom;

pub use registry::*;
pub use sbom::*;
