//! CycloneDX fixtures

use serde_json::{Value, json};

pub const PROJECT: &str = "pkg:npm/project@1.0.0";

/// `(name, version, scope)`; the package URL doubles as the bom-ref.
pub type Entry<'a> = (&'a str, &'a str, &'a str);

pub fn purl(name: &str, version: &str) -> String {
    format!("pkg:npm/{}@{}", name, version)
}

/// Builds a CycloneDX document rooted at [`PROJECT`].
pub fn cyclonedx(components: &[Entry<'_>], dependencies: &[(&str, &[&str])]) -> String {
    let components: Vec<Value> = components
        .iter()
        .map(|(name, version, scope)| {
            let mut component = json!({
                "type": "library",
                "bom-ref": purl(name, version),
                "name": name,
                "version": version,
                "purl": purl(name, version),
            });
            if !scope.is_empty() {
                component["scope"] = json!(scope);
            }
            component
        })
        .collect();

    let dependencies: Vec<Value> = dependencies
        .iter()
        .map(|(reference, depends_on)| json!({"ref": reference, "dependsOn": depends_on}))
        .collect();

    json!({
        "bomFormat": "CycloneDX",
        "specVersion": "1.5",
        "metadata": {
            "component": {
                "type": "application",
                "bom-ref": PROJECT,
                "name": "project",
                "version": "1.0.0",
                "purl": PROJECT,
            }
        },
        "components": components,
        "dependencies": dependencies,
    })
    .to_string()
}
