//! Aggregated lag statistics and the final report

use std::fmt;

use serde::Serialize;

use crate::lag::hotpath::HotPathAnalysis;
use crate::sbom::types::Component;
use crate::version::types::VersionDistance;

/// Lag of a single component
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalLag {
    pub libdays: f64,
    pub version_distance: VersionDistance,
}

impl TechnicalLag {
    pub fn new(libdays: f64, version_distance: VersionDistance) -> Self {
        Self {
            libdays,
            version_distance,
        }
    }
}

/// A component together with its lag and criticality score
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentLag {
    pub component: Component,
    pub technical_lag: TechnicalLag,
    pub criticality_score: f64,
}

impl ComponentLag {
    pub fn new(component: Component, technical_lag: TechnicalLag, criticality_score: f64) -> Self {
        Self {
            component,
            technical_lag,
            criticality_score,
        }
    }

    pub fn libdays(&self) -> f64 {
        self.technical_lag.libdays
    }

    pub fn missed_releases(&self) -> u64 {
        self.technical_lag.version_distance.missed_releases
    }
}

/// The four aggregation buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScopeKind {
    Production,
    Optional,
    DirectProduction,
    DirectOptional,
}

impl ScopeKind {
    pub const ALL: [ScopeKind; 4] = [
        ScopeKind::Production,
        ScopeKind::Optional,
        ScopeKind::DirectProduction,
        ScopeKind::DirectOptional,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Production => "production",
            ScopeKind::Optional => "optional",
            ScopeKind::DirectProduction => "directProduction",
            ScopeKind::DirectOptional => "directOptional",
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Totals, maxima and members of one bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeStats {
    pub libdays: f64,
    pub missed_releases: u64,
    pub missed_major: u64,
    pub missed_minor: u64,
    pub missed_patch: u64,
    pub num_components: usize,

    pub highest_libdays: f64,
    pub highest_missed_releases: u64,
    pub highest_criticality_score: f64,
    pub component_highest_libdays: Option<Component>,
    pub component_highest_missed_releases: Option<Component>,
    pub component_highest_criticality_score: Option<Component>,
    /// Root-to-target path of the highest-criticality component, root excluded
    pub component_highest_criticality_score_path: Option<Vec<ComponentLag>>,

    pub components: Vec<ComponentLag>,
}

impl ScopeStats {
    /// Adds a component to the bucket.
    ///
    /// Maxima only move on a strictly greater value, so the first component
    /// wins ties. Returns `true` if the component became the new
    /// highest-criticality component.
    pub fn record(&mut self, lag: ComponentLag) -> bool {
        let distance = lag.technical_lag.version_distance;

        self.libdays += lag.libdays();
        self.missed_releases += distance.missed_releases;
        self.missed_major += distance.missed_major;
        self.missed_minor += distance.missed_minor;
        self.missed_patch += distance.missed_patch;
        self.num_components += 1;

        if lag.libdays() > self.highest_libdays {
            self.highest_libdays = lag.libdays();
            self.component_highest_libdays = Some(lag.component.clone());
        }
        if distance.missed_releases > self.highest_missed_releases {
            self.highest_missed_releases = distance.missed_releases;
            self.component_highest_missed_releases = Some(lag.component.clone());
        }

        let new_highest_criticality = lag.criticality_score > self.highest_criticality_score;
        if new_highest_criticality {
            self.highest_criticality_score = lag.criticality_score;
            self.component_highest_criticality_score = Some(lag.component.clone());
            self.component_highest_criticality_score_path = None;
        }

        self.components.push(lag);
        new_highest_criticality
    }
}

/// Totals over production and optional components
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LagSummary {
    pub total_components: usize,
    pub total_libdays: f64,
    pub total_missed_releases: u64,
    pub avg_libdays: f64,
    pub avg_missed_releases: f64,
}

impl LagSummary {
    pub fn from_scopes(production: &ScopeStats, optional: &ScopeStats) -> Self {
        let total_components = production.num_components + optional.num_components;
        let total_libdays = production.libdays + optional.libdays;
        let total_missed_releases = production.missed_releases + optional.missed_releases;

        let (avg_libdays, avg_missed_releases) = if total_components > 0 {
            (
                total_libdays / total_components as f64,
                total_missed_releases as f64 / total_components as f64,
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            total_components,
            total_libdays,
            total_missed_releases,
            avg_libdays,
            avg_missed_releases,
        }
    }
}

/// Result of one analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LagReport {
    pub production: ScopeStats,
    pub optional: ScopeStats,
    pub direct_production: ScopeStats,
    pub direct_optional: ScopeStats,
    /// Unix timestamp (seconds) of report creation
    pub timestamp: i64,
    pub summary: LagSummary,
    pub hot_paths: HotPathAnalysis,
}

impl LagReport {
    pub fn scope(&self, kind: ScopeKind) -> &ScopeStats {
        match kind {
            ScopeKind::Production => &self.production,
            ScopeKind::Optional => &self.optional,
            ScopeKind::DirectProduction => &self.direct_production,
            ScopeKind::DirectOptional => &self.direct_optional,
        }
    }

    fn column(&self, value: fn(&ScopeStats) -> u64) -> [u64; 4] {
        ScopeKind::ALL.map(|kind| value(self.scope(kind)))
    }

    pub fn scope_mut(&mut self, kind: ScopeKind) -> &mut ScopeStats {
        match kind {
            ScopeKind::Production => &mut self.production,
            ScopeKind::Optional => &mut self.optional,
            ScopeKind::DirectProduction => &mut self.direct_production,
            ScopeKind::DirectOptional => &mut self.direct_optional,
        }
    }
}

fn count_row(f: &mut fmt::Formatter<'_>, label: &str, values: [u64; 4]) -> fmt::Result {
    let [prod, opt, direct_prod, direct_opt] = values;
    writeln!(
        f,
        "{:<25} prod: {:<10} opt: {:<10} direct prod: {:<10} direct opt: {}",
        label, prod, opt, direct_prod, direct_opt
    )
}

impl fmt::Display for LagReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [prod, opt, direct_prod, direct_opt] = ScopeKind::ALL.map(|kind| self.scope(kind).libdays);

        writeln!(f, "=== Technical Lag Analysis ===")?;
        count_row(f, "Components", self.column(|s| s.num_components as u64))?;
        writeln!(
            f,
            "{:<25} prod: {:<10.2} opt: {:<10.2} direct prod: {:<10.2} direct opt: {:.2}",
            "Libdays", prod, opt, direct_prod, direct_opt
        )?;
        count_row(f, "Missed releases", self.column(|s| s.missed_releases))?;
        count_row(f, "Missed major", self.column(|s| s.missed_major))?;
        count_row(f, "Missed minor", self.column(|s| s.missed_minor))?;
        count_row(f, "Missed patch", self.column(|s| s.missed_patch))?;

        writeln!(f)?;
        writeln!(f, "=== Summary ===")?;
        writeln!(f, "Total components: {}", self.summary.total_components)?;
        writeln!(f, "Total libdays: {:.2}", self.summary.total_libdays)?;
        writeln!(f, "Total missed releases: {}", self.summary.total_missed_releases)?;
        writeln!(f, "Average libdays per component: {:.2}", self.summary.avg_libdays)?;
        writeln!(
            f,
            "Average missed releases per component: {:.2}",
            self.summary.avg_missed_releases
        )
    }
}
