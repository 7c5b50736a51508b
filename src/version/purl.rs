//! Package URL to deps.dev address mapping
//!
//! Parsing and normalization (`pkg:type/namespace/name@version?qualifiers#subpath`)
//! are left to the `packageurl` crate; only the part that addresses a registry
//! lives here.

use std::str::FromStr;

use packageurl::PackageUrl;

use crate::version::error::RegistryError;

/// Registry system plus the escaped package name to request from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryCoordinates {
    pub system: &'static str,
    pub name: String,
}

impl RegistryCoordinates {
    /// Parses `raw`, maps its type onto a deps.dev system name and escapes the
    /// package name as a single URL path segment.
    ///
    /// Version, qualifiers and subpath never contribute to the address.
    pub fn from_purl(raw: &str) -> Result<Self, RegistryError> {
        let purl = PackageUrl::from_str(raw.trim()).map_err(|e| RegistryError::InvalidPurl {
            purl: raw.to_string(),
            reason: e.to_string(),
        })?;

        let joined = |separator: &str| match purl.namespace() {
            Some(namespace) if !namespace.is_empty() => {
                format!("{}{}{}", namespace, separator, purl.name())
            }
            _ => purl.name().to_string(),
        };

        let (system, name) = match purl.ty().to_ascii_lowercase().as_str() {
            "npm" => ("npm", joined("/")),
            "golang" => ("go", joined("/")),
            "cargo" => ("cargo", joined("/")),
            "maven" | "gradle" => ("maven", joined(":")),
            "pypi" => ("pypi", joined("/")),
            "nuget" => ("nuget", joined("/")),
            "gem" => ("rubygems", joined("/")),
            other => return Err(RegistryError::UnsupportedPackageType(other.to_string())),
        };

        Ok(Self {
            system,
            name: urlencoding::encode(&name).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("pkg:npm/lodash@4.17.21", "npm", "lodash")]
    #[case("pkg:npm/%40types/node@20.0.0", "npm", "%40types%2Fnode")]
    #[case("pkg:npm/%40types/node@20.1.0?arch=x64#lib", "npm", "%40types%2Fnode")]
    #[case("pkg:golang/golang.org/x/text@v0.14.0", "go", "golang.org%2Fx%2Ftext")]
    #[case("pkg:cargo/serde", "cargo", "serde")]
    #[case("pkg:maven/org.apache.commons/commons-lang3@3.12.0", "maven", "org.apache.commons%3Acommons-lang3")]
    #[case("pkg:gradle/com.google.guava/guava@31.0", "maven", "com.google.guava%3Aguava")]
    #[case("pkg:pypi/requests@2.28.0", "pypi", "requests")]
    #[case("pkg:nuget/Newtonsoft.Json@13.0.1", "nuget", "Newtonsoft.Json")]
    #[case("pkg:gem/rails@7.0.0", "rubygems", "rails")]
    fn from_purl_maps_supported_types(
        #[case] raw: &str,
        #[case] system: &str,
        #[case] name: &str,
    ) {
        let coordinates = RegistryCoordinates::from_purl(raw).unwrap();

        assert_eq!(coordinates.system, system);
        assert_eq!(coordinates.name, name);
    }

    #[rstest]
    #[case("")]
    #[case("npm/lodash@1.0.0")]
    #[case("pkg:npm")]
    #[case("pkg:npm/")]
    fn from_purl_rejects_malformed_urls(#[case] raw: &str) {
        assert!(matches!(
            RegistryCoordinates::from_purl(raw),
            Err(RegistryError::InvalidPurl { .. })
        ));
    }

    #[test]
    fn from_purl_rejects_unsupported_types() {
        assert!(matches!(
            RegistryCoordinates::from_purl("pkg:github/actions/checkout@v4"),
            Err(RegistryError::UnsupportedPackageType(t)) if t == "github"
        ));
    }
}
