//! Relaxed semantic version parsing
//!
//! Registries publish plenty of versions the strict SemVer grammar rejects
//! (`v1.2.3`, `1.2`, `4.1.0.2`, `1.0.0+build+meta`). [`parse_relaxed`] tries a
//! strict parse first and then rewrites the input one step at a time until it
//! parses or no rewrite applies:
//!
//! 1. more than one `+`: keep the first two `+`-segments, hyphen-join the rest
//!    (`1.0.0+a+b+c` -> `1.0.0+a-b-c`)
//! 2. a leading `v`/`V` is dropped (`v0.14.0` -> `0.14.0`)
//! 3. more than three numeric dot-segments: keep `major.minor.patch` and move
//!    the remaining segments into [`RelaxedVersion::extra`], where they still
//!    take part in ordering (`4.1.0.2` sorts between `4.1.0` and `4.1.1`)
//! 4. partial versions are padded with zeros (`1.2` -> `1.2.0`)
//!
//! Every rule strictly shrinks the input's `+`-count, dot-count or length, or
//! completes a partial core, so the rewrite chain always terminates.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use tracing::debug;

use crate::version::error::DistanceError;

/// Splits a version into its leading numeric dotted core and whatever follows.
static NUMERIC_CORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)*)(.*)$").expect("valid numeric core regex"));

/// A SemVer version plus the numeric segments past `patch` that four-part
/// versions (`4.1.0.2`, common on NuGet) carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaxedVersion {
    pub version: Version,
    pub extra: Vec<u64>,
}

impl RelaxedVersion {
    /// A release is stable when it carries no pre-release tag.
    pub fn is_stable(&self) -> bool {
        self.version.pre.is_empty()
    }
}

impl fmt::Display for RelaxedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version = &self.version;
        write!(f, "{}.{}.{}", version.major, version.minor, version.patch)?;
        for segment in &self.extra {
            write!(f, ".{}", segment)?;
        }
        if !version.pre.is_empty() {
            write!(f, "-{}", version.pre)?;
        }
        if !version.build.is_empty() {
            write!(f, "+{}", version.build)?;
        }
        Ok(())
    }
}

/// Parse a version string, applying the relaxation rules on failure.
pub fn parse_relaxed(raw: &str) -> Result<RelaxedVersion, DistanceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DistanceError::InvalidVersion(raw.to_string()));
    }

    let mut extra = Vec::new();
    let version = relax(trimmed, &mut extra)
        .ok_or_else(|| DistanceError::InvalidVersion(raw.to_string()))?;
    Ok(RelaxedVersion { version, extra })
}

fn relax(candidate: &str, extra: &mut Vec<u64>) -> Option<Version> {
    if let Ok(version) = Version::parse(candidate) {
        return Some(version);
    }
    let next = normalize_once(candidate, extra)?;
    debug!("Normalized version {} -> {}", candidate, next);
    relax(&next, extra)
}

/// Applies the first matching rewrite rule, or `None` when nothing applies.
/// Segments cut off a four-or-more part core are appended to `extra`.
fn normalize_once(version: &str, extra: &mut Vec<u64>) -> Option<String> {
    let plus_segments: Vec<&str> = version.split('+').collect();
    if plus_segments.len() > 2 {
        return Some(format!(
            "{}+{}-{}",
            plus_segments[0],
            plus_segments[1],
            plus_segments[2..].join("-")
        ));
    }

    if let Some(rest) = version.strip_prefix(['v', 'V']) {
        return Some(rest.to_string());
    }

    let captures = NUMERIC_CORE.captures(version)?;
    let core = captures.get(1)?.as_str();
    let tail = captures.get(2).map_or("", |m| m.as_str());
    let segments: Vec<&str> = core.split('.').collect();

    match segments.len() {
        1 => Some(format!("{}.0.0{}", segments[0], tail)),
        2 => Some(format!("{}.{}.0{}", segments[0], segments[1], tail)),
        3 => None,
        _ => {
            for segment in &segments[3..] {
                extra.push(segment.parse().ok()?);
            }
            Some(format!("{}{}", segments[..3].join("."), tail))
        }
    }
}

/// Parses `raw` and keeps it only when it is a stable release.
///
/// Unparsable and pre-release versions are logged at debug level and dropped.
pub fn parse_stable(raw: &str) -> Option<RelaxedVersion> {
    match parse_relaxed(raw) {
        Ok(version) if version.is_stable() => Some(version),
        Ok(version) => {
            debug!("Skipping pre-release version {} ({})", raw, version.version.pre);
            None
        }
        Err(e) => {
            debug!("Skipping unparsable version {}: {}", raw, e);
            None
        }
    }
}

/// Orders versions by `major.minor.patch`, then the extra segments (missing
/// ones count as zero), then SemVer pre-release precedence. Build metadata
/// does not participate.
pub fn compare(a: &RelaxedVersion, b: &RelaxedVersion) -> Ordering {
    let (va, vb) = (&a.version, &b.version);
    (va.major, va.minor, va.patch)
        .cmp(&(vb.major, vb.minor, vb.patch))
        .then_with(|| compare_extra(&a.extra, &b.extra))
        .then_with(|| va.cmp_precedence(vb))
}

fn compare_extra(a: &[u64], b: &[u64]) -> Ordering {
    (0..a.len().max(b.len()))
        .map(|i| {
            let left = a.get(i).copied().unwrap_or(0);
            let right = b.get(i).copied().unwrap_or(0);
            left.cmp(&right)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}
