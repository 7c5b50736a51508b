//! Minimal sets of components covering a share of a bucket's lag

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::config::{DEFAULT_HOTPATH_THRESHOLD, TOP_CONTRIBUTORS};
use crate::lag::report::{ComponentLag, LagReport, ScopeKind, ScopeStats};
use crate::sbom::types::Component;

/// Which lag total a hotpath covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LagMetric {
    Libyears,
    VersionDistance,
}

impl LagMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            LagMetric::Libyears => "libyears",
            LagMetric::VersionDistance => "versionDistance",
        }
    }

    fn contribution(&self, lag: &ComponentLag) -> f64 {
        match self {
            LagMetric::Libyears => lag.libdays(),
            LagMetric::VersionDistance => lag.missed_releases() as f64,
        }
    }

    fn total(&self, stats: &ScopeStats) -> f64 {
        match self {
            LagMetric::Libyears => stats.libdays,
            LagMetric::VersionDistance => stats.missed_releases as f64,
        }
    }
}

impl fmt::Display for LagMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotPathComponent {
    pub component: Component,
    pub contribution: f64,
    pub percentage_of_total: f64,
    /// Share of the total covered by this and every larger contributor
    pub cumulative_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotPath {
    pub metric: LagMetric,
    pub scope: ScopeKind,
    pub total_lag: f64,
    /// Absolute lag the hotpath has to reach (`threshold * total_lag`)
    pub hot_path_threshold: f64,
    pub hot_path_components: Vec<HotPathComponent>,
    pub top_contributors: Vec<HotPathComponent>,
    pub num_hot_path_components: usize,
    /// Percentage of `total_lag` held by the hotpath
    pub hot_path_coverage: f64,
}

impl HotPath {
    fn label(&self) -> String {
        format!("{} ({})", self.scope, self.metric)
    }
}

/// Cross-bucket insights
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotPathSummary {
    /// `scope (metric)` whose largest component holds the highest share
    pub most_critical_scope: Option<String>,
    pub highest_concentration: f64,
    /// `scope (metric)` whose hotpath needs the most components
    pub most_fragmented_scope: Option<String>,
    pub most_fragmented_size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotPathAnalysis {
    pub libyears_hot_paths: Vec<HotPath>,
    pub version_distance_hot_paths: Vec<HotPath>,
    pub summary: HotPathSummary,
}

/// Greedy minimal-cover analysis over aggregated buckets
#[derive(Debug, Clone, Copy)]
pub struct HotPathAnalyzer {
    threshold: f64,
}

impl Default for HotPathAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_HOTPATH_THRESHOLD)
    }
}

impl HotPathAnalyzer {
    /// `threshold` is a fraction of the total. Values outside (0, 1] fall
    /// back to the default.
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold > 0.0 && threshold <= 1.0 {
            threshold
        } else {
            DEFAULT_HOTPATH_THRESHOLD
        };
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Computes the hotpath of one bucket for one metric.
    ///
    /// Zero contributions are ignored. Contributors are walked largest first
    /// (ties keep bucket order) until their sum reaches `threshold * total`.
    pub fn analyze(&self, stats: &ScopeStats, scope: ScopeKind, metric: LagMetric) -> HotPath {
        let total_lag = metric.total(stats);
        let hot_path_threshold = total_lag * self.threshold;
        let percent_of_total = |value: f64| {
            if total_lag > 0.0 {
                value / total_lag * 100.0
            } else {
                0.0
            }
        };

        let mut contributors: Vec<HotPathComponent> = stats
            .components
            .iter()
            .filter_map(|lag| {
                let contribution = metric.contribution(lag);
                (contribution > 0.0).then(|| HotPathComponent {
                    component: lag.component.clone(),
                    contribution,
                    percentage_of_total: percent_of_total(contribution),
                    cumulative_percent: 0.0,
                })
            })
            .collect();
        contributors.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));

        let mut cumulative = 0.0;
        for contributor in contributors.iter_mut() {
            cumulative += contributor.contribution;
            contributor.cumulative_percent = percent_of_total(cumulative);
        }

        let mut hot_path_components = Vec::new();
        if total_lag > 0.0 {
            let mut covered = 0.0;
            for contributor in &contributors {
                covered += contributor.contribution;
                hot_path_components.push(contributor.clone());
                if covered >= hot_path_threshold {
                    break;
                }
            }
        }

        let covered: f64 = hot_path_components.iter().map(|c| c.contribution).sum();
        let hot_path_coverage = percent_of_total(covered);

        contributors.truncate(TOP_CONTRIBUTORS);

        debug!(
            "Hotpath {} ({}): {} of {} contributors cover {:.2}%",
            scope,
            metric,
            hot_path_components.len(),
            stats.components.len(),
            hot_path_coverage
        );

        HotPath {
            metric,
            scope,
            total_lag,
            hot_path_threshold,
            num_hot_path_components: hot_path_components.len(),
            hot_path_components,
            top_contributors: contributors,
            hot_path_coverage,
        }
    }

    /// Analyzes every non-empty bucket of the report for both metrics.
    pub fn analyze_report(&self, report: &LagReport) -> HotPathAnalysis {
        let for_metric = |metric: LagMetric| -> Vec<HotPath> {
            ScopeKind::ALL
                .into_iter()
                .filter(|&kind| report.scope(kind).num_components > 0)
                .map(|kind| self.analyze(report.scope(kind), kind, metric))
                .collect()
        };

        let libyears_hot_paths = for_metric(LagMetric::Libyears);
        let version_distance_hot_paths = for_metric(LagMetric::VersionDistance);
        let summary = summarize(libyears_hot_paths.iter().chain(&version_distance_hot_paths));

        HotPathAnalysis {
            libyears_hot_paths,
            version_distance_hot_paths,
            summary,
        }
    }
}

/// Picks the most concentrated and the most fragmented hotpath.
///
/// Both use strictly-greater comparison, so the first hotpath wins ties.
pub fn summarize<'a>(hot_paths: impl IntoIterator<Item = &'a HotPath>) -> HotPathSummary {
    let mut summary = HotPathSummary::default();

    for hot_path in hot_paths {
        if let Some(largest) = hot_path.hot_path_components.first()
            && largest.percentage_of_total > summary.highest_concentration
        {
            summary.highest_concentration = largest.percentage_of_total;
            summary.most_critical_scope = Some(hot_path.label());
        }

        if hot_path.num_hot_path_components > summary.most_fragmented_size {
            summary.most_fragmented_size = hot_path.num_hot_path_components;
            summary.most_fragmented_scope = Some(hot_path.label());
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lag::report::TechnicalLag;
    use crate::sbom::types::Scope;
    use crate::version::types::VersionDistance;
    use rstest::rstest;

    fn stats(entries: &[(&str, f64, u64)]) -> ScopeStats {
        let mut stats = ScopeStats::default();
        for (name, libdays, missed) in entries {
            stats.record(ComponentLag::new(
                Component::new(name, name, "1.0.0", "", Scope::Required),
                TechnicalLag::new(
                    *libdays,
                    VersionDistance {
                        missed_releases: *missed,
                        missed_patch: *missed,
                        ..Default::default()
                    },
                ),
                0.0,
            ));
        }
        stats
    }

    fn names(components: &[HotPathComponent]) -> Vec<&str> {
        components.iter().map(|c| c.component.name.as_str()).collect()
    }

    #[test]
    fn single_majority_component_forms_the_hotpath() {
        let stats = stats(&[("big", 60.0, 0), ("a", 20.0, 0), ("b", 20.0, 0)]);

        let hot_path =
            HotPathAnalyzer::default().analyze(&stats, ScopeKind::Production, LagMetric::Libyears);

        assert_eq!(names(&hot_path.hot_path_components), vec!["big"]);
        assert_eq!(hot_path.hot_path_coverage, 60.0);
        assert_eq!(hot_path.total_lag, 100.0);
        assert_eq!(hot_path.hot_path_threshold, 50.0);
    }

    #[test]
    fn hotpath_walks_contributors_largest_first() {
        let stats = stats(&[("thirty", 30.0, 0), ("twenty-five", 25.0, 0), ("forty-five", 45.0, 0)]);

        let hot_path =
            HotPathAnalyzer::default().analyze(&stats, ScopeKind::Production, LagMetric::Libyears);

        assert_eq!(names(&hot_path.hot_path_components), vec!["forty-five", "thirty"]);
        assert_eq!(hot_path.num_hot_path_components, 2);
        assert_eq!(hot_path.hot_path_coverage, 75.0);
        assert_eq!(
            names(&hot_path.top_contributors),
            vec!["forty-five", "thirty", "twenty-five"]
        );
        let cumulative: Vec<f64> = hot_path
            .top_contributors
            .iter()
            .map(|c| c.cumulative_percent)
            .collect();
        assert_eq!(cumulative, vec![45.0, 75.0, 100.0]);
    }

    #[test]
    fn zero_contributions_are_excluded_and_ties_keep_bucket_order() {
        let stats = stats(&[("zero", 0.0, 0), ("first", 0.0, 5), ("second", 0.0, 5)]);

        let hot_path = HotPathAnalyzer::default().analyze(
            &stats,
            ScopeKind::Optional,
            LagMetric::VersionDistance,
        );

        assert_eq!(names(&hot_path.top_contributors), vec!["first", "second"]);
        assert_eq!(names(&hot_path.hot_path_components), vec!["first"]);
        assert_eq!(hot_path.hot_path_coverage, 50.0);
    }

    #[test]
    fn zero_total_yields_empty_hotpath() {
        let stats = stats(&[("a", 0.0, 0), ("b", 0.0, 0)]);

        let hot_path =
            HotPathAnalyzer::default().analyze(&stats, ScopeKind::Production, LagMetric::Libyears);

        assert!(hot_path.hot_path_components.is_empty());
        assert!(hot_path.top_contributors.is_empty());
        assert_eq!(hot_path.hot_path_coverage, 0.0);
    }

    #[test]
    fn full_threshold_covers_every_positive_contributor() {
        let stats = stats(&[("a", 10.0, 0), ("b", 5.0, 0), ("c", 0.0, 0)]);

        let hot_path =
            HotPathAnalyzer::new(1.0).analyze(&stats, ScopeKind::Production, LagMetric::Libyears);

        assert_eq!(names(&hot_path.hot_path_components), vec!["a", "b"]);
        assert_eq!(hot_path.hot_path_coverage, 100.0);
    }

    #[test]
    fn top_contributors_are_capped() {
        let entries: Vec<(String, f64, u64)> =
            (1..=15).map(|i| (format!("c{}", i), i as f64, 0)).collect();
        let borrowed: Vec<(&str, f64, u64)> = entries
            .iter()
            .map(|(name, libdays, missed)| (name.as_str(), *libdays, *missed))
            .collect();
        let stats = stats(&borrowed);

        let hot_path =
            HotPathAnalyzer::default().analyze(&stats, ScopeKind::Production, LagMetric::Libyears);

        assert_eq!(hot_path.top_contributors.len(), TOP_CONTRIBUTORS);
        assert_eq!(hot_path.top_contributors[0].component.name, "c15");
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(1.5)]
    #[case(f64::NAN)]
    fn invalid_threshold_falls_back_to_default(#[case] threshold: f64) {
        assert_eq!(
            HotPathAnalyzer::new(threshold).threshold(),
            DEFAULT_HOTPATH_THRESHOLD
        );
    }

    #[test]
    fn analyze_report_skips_empty_buckets_and_summarizes() {
        let mut report = LagReport::default();
        report.production = stats(&[("p1", 80.0, 1), ("p2", 20.0, 1)]);
        report.optional = stats(&[("o1", 10.0, 3), ("o2", 10.0, 3), ("o3", 10.0, 3)]);

        let analysis = HotPathAnalyzer::default().analyze_report(&report);

        let scopes: Vec<ScopeKind> = analysis.libyears_hot_paths.iter().map(|h| h.scope).collect();
        assert_eq!(scopes, vec![ScopeKind::Production, ScopeKind::Optional]);
        assert_eq!(analysis.version_distance_hot_paths.len(), 2);

        assert_eq!(
            analysis.summary.most_critical_scope.as_deref(),
            Some("production (libyears)")
        );
        assert_eq!(analysis.summary.highest_concentration, 80.0);
        assert_eq!(
            analysis.summary.most_fragmented_scope.as_deref(),
            Some("optional (libyears)")
        );
        assert_eq!(analysis.summary.most_fragmented_size, 2);
    }

    #[test]
    fn summary_of_no_hot_paths_is_empty() {
        assert_eq!(summarize(&[]), HotPathSummary::default());
    }
}
