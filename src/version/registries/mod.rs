//! Registry implementations for fetching package versions

pub mod deps_dev;

pub use deps_dev::DepsDevRegistry;
