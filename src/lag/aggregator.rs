//! Scope bucketing and criticality scoring

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::lag::report::{ComponentLag, LagReport, LagSummary, ScopeKind, TechnicalLag};
use crate::sbom::graph::DependencyGraph;
use crate::sbom::types::{Component, Manifest};

/// Share of a bucket's total libdays held by the direct dependencies of
/// `node_ref` that have computed lag.
///
/// Returns 0 when the total is not positive or no direct dependency has lag data.
pub fn criticality(
    node_ref: &str,
    graph: &DependencyGraph<'_>,
    lag_by_ref: &HashMap<String, TechnicalLag>,
    scope_total: f64,
) -> f64 {
    if scope_total <= 0.0 {
        return 0.0;
    }

    let dependency_libdays: f64 = graph
        .direct_dependency_refs(node_ref)
        .filter_map(|dependency| lag_by_ref.get(dependency))
        .map(|lag| lag.libdays)
        .sum();

    dependency_libdays / scope_total
}

/// Buckets computed lags by scope and resolves criticality paths
pub struct ScopeAggregator<'a> {
    manifest: &'a Manifest,
    graph: DependencyGraph<'a>,
}

impl<'a> ScopeAggregator<'a> {
    pub fn new(manifest: &'a Manifest) -> Self {
        Self {
            manifest,
            graph: DependencyGraph::new(manifest),
        }
    }

    /// Builds the report for the lags in `lag_by_ref`, keyed by component reference.
    ///
    /// Components are visited in manifest order. Direct buckets are left empty,
    /// with a warning, when the manifest's direct dependencies cannot be resolved.
    /// Hot paths are not computed here.
    pub fn aggregate(&self, lag_by_ref: &HashMap<String, TechnicalLag>) -> LagReport {
        let with_lag = |component: &'a Component| {
            lag_by_ref
                .get(&component.bom_ref)
                .map(|lag| (component, *lag))
        };

        let members: Vec<Member<'a>> = self
            .manifest
            .components
            .iter()
            .flatten()
            .filter_map(with_lag)
            .collect();

        let direct_members: Vec<Member<'a>> = match self.graph.direct_dependencies_of_root() {
            Ok(direct) => direct.into_iter().filter_map(with_lag).collect(),
            Err(e) => {
                warn!("Failed to get direct dependencies: {}", e);
                Vec::new()
            }
        };

        let all_totals = BucketTotals::of(&members);
        let direct_totals = BucketTotals::of(&direct_members);

        let mut report = LagReport {
            timestamp: Utc::now().timestamp(),
            ..Default::default()
        };

        for (family, totals, production, optional) in [
            (&members, all_totals, ScopeKind::Production, ScopeKind::Optional),
            (
                &direct_members,
                direct_totals,
                ScopeKind::DirectProduction,
                ScopeKind::DirectOptional,
            ),
        ] {
            for &(component, lag) in family {
                let is_production = component.scope.is_production();
                let kind = if is_production { production } else { optional };
                let score = criticality(
                    &component.bom_ref,
                    &self.graph,
                    lag_by_ref,
                    totals.for_scope(is_production),
                );

                let entry = ComponentLag::new(component.clone(), lag, score);
                let stats = report.scope_mut(kind);
                if stats.record(entry.clone()) {
                    stats.component_highest_criticality_score_path =
                        self.criticality_path(&entry, lag_by_ref, &totals);
                }
            }
        }

        report.summary = LagSummary::from_scopes(&report.production, &report.optional);

        info!(
            "Aggregated {} components ({} direct)",
            report.summary.total_components,
            report.direct_production.num_components + report.direct_optional.num_components
        );

        report
    }

    /// Path from the root to `target`. The last element is `target` itself as
    /// recorded in its bucket; every other element is scored against the
    /// total of its own production or optional bucket within the same family.
    /// Elements without computed lag carry a zero lag.
    fn criticality_path(
        &self,
        target: &ComponentLag,
        lag_by_ref: &HashMap<String, TechnicalLag>,
        totals: &BucketTotals,
    ) -> Option<Vec<ComponentLag>> {
        let target_ref = target.component.bom_ref.as_str();
        let path = match self.graph.path_from_root_to(target_ref) {
            Ok(Some(path)) => path,
            Ok(None) => {
                debug!("Highest-criticality component {} is unreachable from root", target_ref);
                return None;
            }
            Err(e) => {
                warn!("Failed to resolve dependency path to {}: {}", target_ref, e);
                return None;
            }
        };

        let path = path
            .into_iter()
            .map(|component| {
                if component.bom_ref == target_ref {
                    return target.clone();
                }
                let lag = lag_by_ref
                    .get(&component.bom_ref)
                    .copied()
                    .unwrap_or_default();
                let scope_total = totals.for_scope(component.scope.is_production());
                let score = criticality(&component.bom_ref, &self.graph, lag_by_ref, scope_total);
                ComponentLag::new(component.clone(), lag, score)
            })
            .collect();

        Some(path)
    }
}

/// A component that has computed lag
type Member<'a> = (&'a Component, TechnicalLag);

/// Libday totals of the production and optional halves of a bucket family
#[derive(Debug, Clone, Copy, Default)]
struct BucketTotals {
    production: f64,
    optional: f64,
}

impl BucketTotals {
    fn of(members: &[Member<'_>]) -> Self {
        let mut totals = Self::default();
        for (component, lag) in members {
            if component.scope.is_production() {
                totals.production += lag.libdays;
            } else {
                totals.optional += lag.libdays;
            }
        }
        totals
    }

    fn for_scope(&self, production: bool) -> f64 {
        if production {
            self.production
        } else {
            self.optional
        }
    }
}
