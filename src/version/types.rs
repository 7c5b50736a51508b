//! Common types shared by the registry client and the distance engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single release of a package as reported by the version registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    pub version: String,
    /// ISO-8601 / RFC 3339 publish timestamp, if the registry knows it
    pub published_at: Option<String>,
}

impl VersionRecord {
    pub fn new(version: impl Into<String>, published_at: Option<&str>) -> Self {
        Self {
            version: version.into(),
            published_at: published_at.map(str::to_string),
        }
    }

    /// Parses the publish timestamp. Returns `None` when it is absent or malformed.
    pub fn published_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.published_at.as_deref()?;
        if raw.is_empty() {
            return None;
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Release-count lag between a used version and the newest known release
///
/// `missed_major + missed_minor + missed_patch == missed_releases` always holds
/// for values produced by [`crate::version::distance::release_distance`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDistance {
    pub missed_releases: u64,
    pub missed_major: u64,
    pub missed_minor: u64,
    pub missed_patch: u64,
}

impl VersionDistance {
    pub fn is_consistent(&self) -> bool {
        self.missed_major + self.missed_minor + self.missed_patch == self.missed_releases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("2021-01-20T14:45:30Z"), true)]
    #[case(Some("2021-01-20T14:45:30.123456+02:00"), true)]
    #[case(Some("2021-01-20"), false)]
    #[case(Some(""), false)]
    #[case(None, false)]
    fn published_time_accepts_only_rfc3339(#[case] raw: Option<&str>, #[case] valid: bool) {
        let record = VersionRecord::new("1.0.0", raw);
        assert_eq!(record.published_time().is_some(), valid);
    }

    #[test]
    fn published_time_normalizes_to_utc() {
        let record = VersionRecord::new("1.0.0", Some("2021-01-20T16:00:00+02:00"));
        let expected = DateTime::parse_from_rfc3339("2021-01-20T14:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(record.published_time(), Some(expected));
    }
}
