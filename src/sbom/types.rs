//! In-memory manifest model

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Dependency scope as declared in the manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Scope {
    /// No scope declared
    #[default]
    Empty,
    Required,
    Runtime,
    Optional,
    Other(String),
}

impl Scope {
    /// Production scopes are the undeclared scope, `required` and `runtime`.
    /// Everything else counts as optional.
    pub fn is_production(&self) -> bool {
        matches!(self, Scope::Empty | Scope::Required | Scope::Runtime)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Scope::Empty => "",
            Scope::Required => "required",
            Scope::Runtime => "runtime",
            Scope::Optional => "optional",
            Scope::Other(raw) => raw,
        }
    }
}

impl From<&str> for Scope {
    fn from(raw: &str) -> Self {
        match raw {
            "" => Scope::Empty,
            "required" => Scope::Required,
            "runtime" => Scope::Runtime,
            "optional" => Scope::Optional,
            other => Scope::Other(other.to_string()),
        }
    }
}

impl From<String> for Scope {
    fn from(raw: String) -> Self {
        Scope::from(raw.as_str())
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.as_str().to_string()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A package entry of the manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Component {
    /// Unique reference within the manifest
    pub bom_ref: String,
    pub name: String,
    /// Empty when the manifest omits it
    pub version: String,
    /// Package URL, empty when the manifest omits it
    pub purl: String,
    pub scope: Scope,
    /// CycloneDX component type (`library`, `application`, ...)
    #[serde(skip_serializing_if = "String::is_empty")]
    pub component_type: String,
}

impl Component {
    pub fn new(bom_ref: &str, name: &str, version: &str, purl: &str, scope: Scope) -> Self {
        Self {
            bom_ref: bom_ref.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            purl: purl.to_string(),
            scope,
            component_type: String::new(),
        }
    }
}

/// `reference` depends on each entry of `depends_on`, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyEdge {
    pub reference: String,
    pub depends_on: Vec<String>,
}

impl DependencyEdge {
    pub fn new(reference: &str, depends_on: &[&str]) -> Self {
        Self {
            reference: reference.to_string(),
            depends_on: depends_on.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// A decoded dependency manifest
///
/// Sections absent from the source document stay `None`; graph queries
/// report them as structural errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// The project component the manifest describes
    pub root: Option<Component>,
    pub components: Option<Vec<Component>>,
    pub dependencies: Option<Vec<DependencyEdge>>,
}

/// Component counts by type, scope and purl presence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStats {
    pub total: usize,
    pub by_type: IndexMap<String, usize>,
    pub by_scope: IndexMap<String, usize>,
    pub with_purl: usize,
    pub without_purl: usize,
}

impl Manifest {
    /// Reference of the root component, if declared and non-empty
    pub fn root_ref(&self) -> Option<&str> {
        self.root
            .as_ref()
            .map(|root| root.bom_ref.as_str())
            .filter(|r| !r.is_empty())
    }

    /// Components whose scope is one of `scopes`. An empty filter returns all
    /// components; an undeclared scope matches `"unspecified"`.
    pub fn components_in_scopes(&self, scopes: &[&str]) -> Vec<&Component> {
        let Some(components) = &self.components else {
            return Vec::new();
        };
        components
            .iter()
            .filter(|c| scopes.is_empty() || scopes.contains(&scope_label(&c.scope)))
            .collect()
    }

    /// Returns `None` when the manifest has no components section.
    pub fn component_stats(&self) -> Option<ComponentStats> {
        let components = self.components.as_ref()?;

        let mut stats = ComponentStats {
            total: components.len(),
            ..Default::default()
        };
        for component in components {
            let component_type = if component.component_type.is_empty() {
                "unknown"
            } else {
                component.component_type.as_str()
            };
            *stats.by_type.entry(component_type.to_string()).or_default() += 1;
            *stats
                .by_scope
                .entry(scope_label(&component.scope).to_string())
                .or_default() += 1;

            if component.purl.is_empty() {
                stats.without_purl += 1;
            } else {
                stats.with_purl += 1;
            }
        }

        Some(stats)
    }
}

fn scope_label(scope: &Scope) -> &str {
    match scope {
        Scope::Empty => "unspecified",
        other => other.as_str(),
    }
}
