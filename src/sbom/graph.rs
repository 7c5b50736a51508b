//! Adjacency view over a manifest's dependency section

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;
use tracing::{debug, warn};

use crate::sbom::types::{Component, Manifest};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Project reference not found in dependencies: {0}")]
    ProjectNotFound(String),

    #[error("No direct dependencies found for project: {0}")]
    NoDirectDependencies(String),
}

type ComponentIndex<'a> = IndexMap<&'a str, &'a Component>;
type Adjacency<'a> = HashMap<&'a str, IndexSet<&'a str>>;

/// Read-only dependency graph keyed by component reference
///
/// The graph is not assumed to be acyclic. Every traversal keeps a visited set.
pub struct DependencyGraph<'a> {
    root_ref: Option<&'a str>,
    components: Option<ComponentIndex<'a>>,
    adjacency: Option<Adjacency<'a>>,
}

impl<'a> DependencyGraph<'a> {
    pub fn new(manifest: &'a Manifest) -> Self {
        let components = manifest.components.as_ref().map(|components| {
            let mut by_ref = IndexMap::with_capacity(components.len());
            for component in components {
                if by_ref.insert(component.bom_ref.as_str(), component).is_some() {
                    warn!("Duplicate component reference: {}", component.bom_ref);
                }
            }
            by_ref
        });

        let adjacency = manifest.dependencies.as_ref().map(|edges| {
            let mut adjacency: Adjacency<'a> = HashMap::with_capacity(edges.len());
            for edge in edges {
                adjacency
                    .entry(edge.reference.as_str())
                    .or_default()
                    .extend(edge.depends_on.iter().map(String::as_str));
            }
            adjacency
        });

        Self {
            root_ref: manifest.root_ref(),
            components,
            adjacency,
        }
    }

    pub fn root_ref(&self) -> Option<&'a str> {
        self.root_ref
    }

    pub fn component(&self, reference: &str) -> Option<&'a Component> {
        self.components.as_ref()?.get(reference).copied()
    }

    /// Root reference plus both sections, or `InvalidInput` naming the missing part
    fn validated(&self) -> Result<(&'a str, &ComponentIndex<'a>, &Adjacency<'a>), GraphError> {
        let root_ref = self
            .root_ref
            .ok_or_else(|| GraphError::InvalidInput("manifest has no root reference".to_string()))?;
        let adjacency = self.adjacency.as_ref().ok_or_else(|| {
            GraphError::InvalidInput("manifest has no dependencies section".to_string())
        })?;
        let components = self.components.as_ref().ok_or_else(|| {
            GraphError::InvalidInput("manifest has no components section".to_string())
        })?;
        Ok((root_ref, components, adjacency))
    }

    /// Components the root depends on directly, in declaration order
    pub fn direct_dependencies_of_root(&self) -> Result<Vec<&'a Component>, GraphError> {
        let (root_ref, components, adjacency) = self.validated()?;

        let refs = adjacency
            .get(root_ref)
            .ok_or_else(|| GraphError::ProjectNotFound(root_ref.to_string()))?;
        if refs.is_empty() {
            return Err(GraphError::NoDirectDependencies(root_ref.to_string()));
        }

        let mut direct = Vec::with_capacity(refs.len());
        for reference in refs {
            match components.get(reference) {
                Some(component) => direct.push(*component),
                None => warn!("Direct dependency reference not found in components: {}", reference),
            }
        }

        debug!(
            "Found {} direct dependencies of {} ({} unresolved)",
            direct.len(),
            root_ref,
            refs.len() - direct.len()
        );
        Ok(direct)
    }

    /// Components `reference` depends on directly. Unknown or leaf references
    /// yield an empty list.
    pub fn direct_dependencies_of(&self, reference: &str) -> Vec<&'a Component> {
        self.direct_dependency_refs(reference)
            .filter_map(|dependency| self.component(dependency))
            .collect()
    }

    /// References `reference` depends on directly, resolved or not
    pub fn direct_dependency_refs(&self, reference: &str) -> impl Iterator<Item = &'a str> + '_ {
        self.adjacency
            .as_ref()
            .and_then(|adjacency| adjacency.get(reference))
            .into_iter()
            .flat_map(|refs| refs.iter().copied())
    }

    /// Components that depend directly on `reference`, in component order
    pub fn dependents_of(&self, reference: &str) -> Vec<&'a Component> {
        let Some(adjacency) = &self.adjacency else {
            return Vec::new();
        };
        let Some(components) = &self.components else {
            return Vec::new();
        };

        components
            .iter()
            .filter(|(candidate, _)| {
                adjacency
                    .get(*candidate)
                    .is_some_and(|refs| refs.contains(reference))
            })
            .map(|(_, component)| *component)
            .collect()
    }

    /// Shortest path from the root to `target` by breadth-first search.
    ///
    /// The path excludes the root and ends with the target. Returns
    /// `Ok(None)` when the target is unreachable, or when a reference on the
    /// path has no component entry.
    pub fn path_from_root_to(&self, target: &str) -> Result<Option<Vec<&'a Component>>, GraphError> {
        if target.is_empty() {
            return Err(GraphError::InvalidInput("empty target reference".to_string()));
        }
        let (root_ref, components, adjacency) = self.validated()?;

        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();
        let mut parent: HashMap<&'a str, &'a str> = HashMap::new();

        queue.push_back(root_ref);
        visited.insert(root_ref);

        while let Some(current) = queue.pop_front() {
            if current == target {
                let mut refs = Vec::new();
                let mut node = current;
                while node != root_ref {
                    refs.push(node);
                    match parent.get(node) {
                        Some(&previous) => node = previous,
                        None => break,
                    }
                }
                refs.reverse();

                let path: Option<Vec<&'a Component>> = refs
                    .into_iter()
                    .map(|reference| {
                        let component = components.get(reference).copied();
                        if component.is_none() {
                            warn!("Path reference not found in components: {}", reference);
                        }
                        component
                    })
                    .collect();
                return Ok(path);
            }

            let Some(next) = adjacency.get(current) else {
                continue;
            };
            for &dependency in next {
                if visited.insert(dependency) {
                    parent.insert(dependency, current);
                    queue.push_back(dependency);
                }
            }
        }

        debug!("No path from {} to {}", root_ref, target);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom::types::{DependencyEdge, Scope};
    use rstest::rstest;

    fn component(reference: &str) -> Component {
        Component::new(
            reference,
            reference,
            "1.0.0",
            &format!("pkg:npm/{}@1.0.0", reference),
            Scope::Required,
        )
    }

    fn manifest(edges: &[(&str, &[&str])], components: &[&str]) -> Manifest {
        Manifest {
            root: Some(component("root")),
            components: Some(components.iter().map(|r| component(r)).collect()),
            dependencies: Some(
                edges
                    .iter()
                    .map(|(reference, depends_on)| DependencyEdge::new(reference, depends_on))
                    .collect(),
            ),
        }
    }

    fn refs(components: &[&Component]) -> Vec<String> {
        components.iter().map(|c| c.bom_ref.clone()).collect()
    }

    #[test]
    fn direct_dependencies_of_root_returns_components_in_declaration_order() {
        let manifest = manifest(
            &[("root", &["b", "a", "missing"]), ("a", &["c"])],
            &["a", "b", "c"],
        );
        let graph = DependencyGraph::new(&manifest);

        let direct = graph.direct_dependencies_of_root().unwrap();

        assert_eq!(refs(&direct), vec!["b", "a"]);
    }

    #[test]
    fn direct_dependencies_of_root_fails_when_root_has_no_entry() {
        let manifest = manifest(&[("a", &["b"])], &["a", "b"]);
        let graph = DependencyGraph::new(&manifest);

        assert_eq!(
            graph.direct_dependencies_of_root(),
            Err(GraphError::ProjectNotFound("root".to_string()))
        );
    }

    #[test]
    fn direct_dependencies_of_root_fails_when_root_entry_is_empty() {
        let manifest = manifest(&[("root", &[])], &["a"]);
        let graph = DependencyGraph::new(&manifest);

        assert_eq!(
            graph.direct_dependencies_of_root(),
            Err(GraphError::NoDirectDependencies("root".to_string()))
        );
    }

    #[rstest]
    #[case("a", vec!["c", "d"])]
    #[case("c", vec![])]
    #[case("unknown", vec![])]
    fn direct_dependencies_of_returns_empty_for_leaves_and_unknown_refs(
        #[case] reference: &str,
        #[case] expected: Vec<&str>,
    ) {
        let manifest = manifest(
            &[("root", &["a"]), ("a", &["c", "d"]), ("c", &[])],
            &["a", "c", "d"],
        );
        let graph = DependencyGraph::new(&manifest);

        assert_eq!(refs(&graph.direct_dependencies_of(reference)), expected);
    }

    #[test]
    fn dependents_of_returns_components_depending_on_reference() {
        let manifest = manifest(
            &[("root", &["a", "b"]), ("a", &["c"]), ("b", &["c"])],
            &["a", "b", "c"],
        );
        let graph = DependencyGraph::new(&manifest);

        assert_eq!(refs(&graph.dependents_of("c")), vec!["a", "b"]);
        assert!(graph.dependents_of("a").is_empty());
    }

    #[test]
    fn path_from_root_to_returns_shortest_path_without_root() {
        let manifest = manifest(
            &[
                ("root", &["direct", "other"]),
                ("direct", &["intermediate"]),
                ("intermediate", &["target"]),
                ("other", &["x"]),
                ("x", &["y"]),
                ("y", &["target"]),
            ],
            &["direct", "intermediate", "target", "other", "x", "y"],
        );
        let graph = DependencyGraph::new(&manifest);

        let path = graph.path_from_root_to("target").unwrap().unwrap();

        assert_eq!(refs(&path), vec!["direct", "intermediate", "target"]);
    }

    #[test]
    fn path_from_root_to_direct_dependency_has_single_element() {
        let manifest = manifest(&[("root", &["direct"])], &["direct"]);
        let graph = DependencyGraph::new(&manifest);

        let path = graph.path_from_root_to("direct").unwrap().unwrap();

        assert_eq!(refs(&path), vec!["direct"]);
    }

    #[test]
    fn path_from_root_to_terminates_on_cycles() {
        let manifest = manifest(
            &[("root", &["a"]), ("a", &["b"]), ("b", &["a", "root"])],
            &["a", "b", "island"],
        );
        let graph = DependencyGraph::new(&manifest);

        assert_eq!(graph.path_from_root_to("island"), Ok(None));
        assert_eq!(
            refs(&graph.path_from_root_to("b").unwrap().unwrap()),
            vec!["a", "b"]
        );
    }

    #[test]
    fn path_from_root_to_returns_none_when_path_crosses_unknown_reference() {
        // "ghost" is listed in dependencies but has no component entry.
        let manifest = manifest(
            &[("root", &["ghost"]), ("ghost", &["target"])],
            &["target"],
        );
        let graph = DependencyGraph::new(&manifest);

        assert_eq!(graph.path_from_root_to("target"), Ok(None));
    }

    #[test]
    fn path_from_root_to_returns_none_for_unreachable_target() {
        let manifest = manifest(&[("root", &["a"]), ("b", &["c"])], &["a", "b", "c"]);
        let graph = DependencyGraph::new(&manifest);

        assert_eq!(graph.path_from_root_to("c"), Ok(None));
    }

    #[test]
    fn path_from_root_to_rejects_empty_target() {
        let manifest = manifest(&[("root", &["a"])], &["a"]);
        let graph = DependencyGraph::new(&manifest);

        assert!(matches!(
            graph.path_from_root_to(""),
            Err(GraphError::InvalidInput(_))
        ));
    }

    #[rstest]
    #[case(Manifest { root: None, ..manifest(&[("root", &["a"])], &["a"]) })]
    #[case(Manifest { dependencies: None, ..manifest(&[("root", &["a"])], &["a"]) })]
    #[case(Manifest { components: None, ..manifest(&[("root", &["a"])], &["a"]) })]
    fn structural_queries_reject_incomplete_manifests(#[case] manifest: Manifest) {
        let graph = DependencyGraph::new(&manifest);

        assert!(matches!(
            graph.path_from_root_to("a"),
            Err(GraphError::InvalidInput(_))
        ));
        assert!(matches!(
            graph.direct_dependencies_of_root(),
            Err(GraphError::InvalidInput(_))
        ));
    }
}
