//! Technical lag metrics between a used version and a registry's release history
//!
//! - [`release_distance`]: how many stable releases came after the used version,
//!   split into major / minor / patch bumps
//! - [`time_distance`]: elapsed time between the used version's publish date and
//!   the newest publish date in the history ("libdays" once divided by a day)

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, warn};

use crate::version::error::DistanceError;
use crate::version::semver::{RelaxedVersion, compare, parse_relaxed, parse_stable};
use crate::version::types::{VersionDistance, VersionRecord};

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Kind of release bump between two consecutive versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bump {
    Major,
    Minor,
    Patch,
}

/// The first of major, minor, patch that increased decides the bump.
/// Versions differing only below patch level (extra segments, pre-release)
/// count as a patch release.
fn classify(previous: &RelaxedVersion, current: &RelaxedVersion) -> Bump {
    let (before, after) = (&previous.version, &current.version);
    if after.major > before.major {
        Bump::Major
    } else if after.minor > before.minor {
        Bump::Minor
    } else if after.patch > before.patch {
        Bump::Patch
    } else {
        debug!(
            "No segment increased between {} and {}, counting as patch",
            previous, current
        );
        Bump::Patch
    }
}

/// Counts the releases published after `used`.
///
/// Candidates that fail to parse or carry a pre-release tag are ignored. The
/// used version is inserted into the sorted candidates when it is not one of
/// them; it never counts towards the totals.
///
/// Each missed release is classified against the release immediately before it
/// in the sorted sequence, not against `used`. This models stepping through the
/// upgrade path one release at a time: for `1.0.0` with candidates
/// `1.0.1, 1.2.0, 1.2.3, 2.0.3` the result is one major, one minor and two
/// patch releases.
pub fn release_distance(
    used: &str,
    candidates: &[String],
) -> Result<VersionDistance, DistanceError> {
    if candidates.is_empty() {
        return Err(DistanceError::EmptyInput);
    }

    let used_version = parse_relaxed(used)?;

    let mut sorted: Vec<RelaxedVersion> = candidates.iter().filter_map(|v| parse_stable(v)).collect();
    if sorted.is_empty() {
        return Err(DistanceError::NoValidVersions {
            skipped: candidates.len(),
        });
    }
    sorted.sort_by(compare);

    let used_index = sorted.partition_point(|v| compare(v, &used_version).is_lt());
    let already_listed = sorted
        .get(used_index)
        .is_some_and(|v| compare(v, &used_version).is_eq());
    if !already_listed {
        sorted.insert(used_index, used_version);
    }

    let missed_releases = (sorted.len() - 1 - used_index) as u64;
    let mut distance = VersionDistance {
        missed_releases,
        ..VersionDistance::default()
    };

    for pair in sorted[used_index..].windows(2) {
        match classify(&pair[0], &pair[1]) {
            Bump::Major => distance.missed_major += 1,
            Bump::Minor => distance.missed_minor += 1,
            Bump::Patch => distance.missed_patch += 1,
        }
    }

    let distance = reconcile(distance, used);

    debug!(
        "Version distance for {}: {} valid candidates, {} missed ({} major, {} minor, {} patch)",
        used,
        sorted.len() - usize::from(!already_listed),
        distance.missed_releases,
        distance.missed_major,
        distance.missed_minor,
        distance.missed_patch
    );

    Ok(distance)
}

/// Makes the category counts add up to `missed_releases`, letting the patch
/// count absorb any discrepancy.
fn reconcile(mut distance: VersionDistance, used: &str) -> VersionDistance {
    if distance.is_consistent() {
        return distance;
    }

    warn!(
        "Version distance inconsistency for {}: total {} but major {} + minor {} + patch {}",
        used,
        distance.missed_releases,
        distance.missed_major,
        distance.missed_minor,
        distance.missed_patch
    );

    let major_minor = distance.missed_major + distance.missed_minor;
    if major_minor > distance.missed_releases {
        // Patch alone cannot absorb this; trim minor, then major.
        let overflow = major_minor - distance.missed_releases;
        let minor_cut = overflow.min(distance.missed_minor);
        distance.missed_minor -= minor_cut;
        distance.missed_major -= overflow - minor_cut;
    }
    distance.missed_patch =
        distance.missed_releases - distance.missed_major - distance.missed_minor;
    distance
}

/// Time between the used version's publish date and the newest publish date.
///
/// Records without a valid timestamp, unparsable versions and pre-releases are
/// ignored. The used version must be present in what remains.
pub fn time_distance(used: &str, records: &[VersionRecord]) -> Result<TimeDelta, DistanceError> {
    if records.is_empty() {
        return Err(DistanceError::EmptyInput);
    }

    let used_version = parse_relaxed(used)?;

    let dated: Vec<(RelaxedVersion, DateTime<Utc>)> = records
        .iter()
        .filter_map(|record| {
            let Some(published) = record.published_time() else {
                debug!("Skipping version {} without valid publish date", record.version);
                return None;
            };
            parse_stable(&record.version).map(|version| (version, published))
        })
        .collect();

    let Some(newest) = dated.iter().map(|(_, published)| *published).max() else {
        return Err(DistanceError::NoValidVersions {
            skipped: records.len(),
        });
    };

    let used_published = dated
        .iter()
        .find(|(version, _)| compare(version, &used_version).is_eq())
        .map(|(_, published)| *published)
        .ok_or_else(|| DistanceError::VersionNotFound(used.to_string()))?;

    let elapsed = newest - used_published;
    if elapsed < TimeDelta::zero() {
        warn!(
            "Negative time lag for {} ({} -> {}), clamping to zero",
            used, used_published, newest
        );
        return Ok(TimeDelta::zero());
    }

    debug!(
        "Time lag for {}: published {}, newest {}, {:.2} days",
        used,
        used_published,
        newest,
        to_days(elapsed)
    );

    Ok(elapsed)
}

/// Converts a lag duration to fractional days.
pub fn to_days(elapsed: TimeDelta) -> f64 {
    elapsed.num_milliseconds() as f64 / MILLIS_PER_DAY
}
