//! CycloneDX JSON decoding

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::sbom::types::{Component, DependencyEdge, Manifest, Scope};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to decode CycloneDX JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported BOM format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBom {
    #[serde(default)]
    bom_format: Option<String>,
    #[serde(default)]
    metadata: Option<RawMetadata>,
    #[serde(default)]
    components: Option<Vec<RawComponent>>,
    #[serde(default)]
    dependencies: Option<Vec<RawDependency>>,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    component: Option<RawComponent>,
}

#[derive(Debug, Deserialize)]
struct RawComponent {
    #[serde(rename = "bom-ref", default)]
    bom_ref: Option<String>,
    #[serde(rename = "type", default)]
    component_type: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    purl: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    // Assemblies nest their parts.
    #[serde(default)]
    components: Vec<RawComponent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDependency {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(default)]
    depends_on: Vec<String>,
}

impl RawComponent {
    /// Splits off the nested parts. A component without `bom-ref` is
    /// identified by its purl, else by `name@version`.
    fn split(self) -> (Component, Vec<RawComponent>) {
        let version = self.version.unwrap_or_default();
        let purl = self.purl.unwrap_or_default();
        let bom_ref = match self.bom_ref.filter(|r| !r.is_empty()) {
            Some(bom_ref) => bom_ref,
            None if !purl.is_empty() => purl.clone(),
            None => format!("{}@{}", self.name, version),
        };

        let component = Component {
            bom_ref,
            name: self.name,
            version,
            purl,
            scope: Scope::from(self.scope.unwrap_or_default()),
            component_type: self.component_type.unwrap_or_default(),
        };
        (component, self.components)
    }

    fn flatten_into(self, out: &mut Vec<Component>) {
        let (component, nested) = self.split();
        out.push(component);
        for part in nested {
            part.flatten_into(out);
        }
    }
}

impl Manifest {
    /// Decodes a CycloneDX JSON document.
    ///
    /// Sections missing from the document are left as `None`.
    pub fn from_cyclonedx_json(content: &str) -> Result<Self, ManifestError> {
        let raw: RawBom = serde_json::from_str(content)?;

        if let Some(format) = raw.bom_format.as_deref()
            && format != "CycloneDX"
        {
            return Err(ManifestError::UnsupportedFormat(format.to_string()));
        }

        let root = raw
            .metadata
            .and_then(|metadata| metadata.component)
            .map(|component| component.split().0);
        if root.is_none() {
            warn!("CycloneDX document has no metadata component");
        }

        let components = raw.components.map(|raw_components| {
            let mut components = Vec::with_capacity(raw_components.len());
            for component in raw_components {
                component.flatten_into(&mut components);
            }
            components
        });

        let dependencies = raw.dependencies.map(|raw_dependencies| {
            raw_dependencies
                .into_iter()
                .map(|dependency| DependencyEdge {
                    reference: dependency.reference,
                    depends_on: dependency.depends_on,
                })
                .collect::<Vec<_>>()
        });

        debug!(
            "Decoded CycloneDX manifest: {} components, {} dependency entries",
            components.as_ref().map_or(0, Vec::len),
            dependencies.as_ref().map_or(0, Vec::len)
        );

        Ok(Manifest {
            root,
            components,
            dependencies,
        })
    }

    /// Reads and decodes a CycloneDX JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_cyclonedx_json(&content)
    }
}
