//! Technical lag analysis
//!
//! ```text
//! Manifest ──▶ LagCalculator ──▶ ScopeAggregator ──▶ HotPathAnalyzer
//!              (per component)   (LagReport)         (HotPathAnalysis)
//! ```
//!
//! # Modules
//!
//! - [`calculator`]: Bounded worker pool computing each component's lag
//! - [`aggregator`]: Scope buckets, criticality scores and criticality paths
//! - [`hotpath`]: Smallest set of components covering most of a bucket's lag
//! - [`report`]: `TechnicalLag`, `ScopeStats` and the final `LagReport`

pub mod aggregator;
pub mod calculator;
pub mod hotpath;
pub mod report;
