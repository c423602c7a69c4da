//! Semantic version arithmetic
//!
//! Computes the next version from the current one and a release magnitude,
//! and normalises git tags into version strings.

use crate::core::config::Magnitude;
use crate::core::error::{ReleaseResult, VersionError};
use regex::Regex;
use semver::Version;
use std::sync::OnceLock;

/// Version used for a repository's very first release.
pub const FIRST_VERSION: &str = "0.1.0";

/// Strip a leading `v` or `version` / `version-` prefix (case-insensitive)
/// from a tag name, leaving the bare version string.
pub fn version_from_tag(tag: &str) -> String {
  static RE: OnceLock<Regex> = OnceLock::new();
  // Longer alternative first, or "version-1.2.3" would strip only the "v".
  let re = RE.get_or_init(|| Regex::new(r"(?i)^(version-?|v)").unwrap());
  re.replace(tag.trim(), "").to_string()
}

fn parse_version(version: &str) -> ReleaseResult<Version> {
  let bare = version_from_tag(version);

  // semver requires exactly major.minor.patch; surface short forms like
  // "1.2" with a message naming the offending input.
  Version::parse(&bare).map_err(|err| {
    VersionError::new(format!(
      "invalid version '{}': {} (expected at least major.minor.patch)",
      version, err
    ))
    .into()
  })
}

/// Compute the next version.
///
/// With no current version the first release is always 0.1.0 regardless of
/// magnitude. With no magnitude the current version is returned unchanged.
/// Prerelease and build metadata are dropped when bumping.
pub fn next_version(current: Option<&str>, magnitude: Option<Magnitude>) -> ReleaseResult<String> {
  let Some(current) = current else {
    return Ok(FIRST_VERSION.to_string());
  };

  let mut version = parse_version(current)?;

  let Some(magnitude) = magnitude else {
    return Ok(version.to_string());
  };

  match magnitude {
    Magnitude::Major => {
      version.major += 1;
      version.minor = 0;
      version.patch = 0;
    }
    Magnitude::Minor => {
      version.minor += 1;
      version.patch = 0;
    }
    Magnitude::Patch => {
      version.patch += 1;
    }
  }

  version.pre = semver::Prerelease::EMPTY;
  version.build = semver::BuildMetadata::EMPTY;

  Ok(version.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_first_release_is_0_1_0() {
    assert_eq!(next_version(None, Some(Magnitude::Major)).unwrap(), "0.1.0");
    assert_eq!(next_version(None, None).unwrap(), "0.1.0");
  }

  #[test]
  fn test_bump_each_magnitude() {
    assert_eq!(next_version(Some("1.2.3"), Some(Magnitude::Patch)).unwrap(), "1.2.4");
    assert_eq!(next_version(Some("1.2.3"), Some(Magnitude::Minor)).unwrap(), "1.3.0");
    assert_eq!(next_version(Some("1.2.3"), Some(Magnitude::Major)).unwrap(), "2.0.0");
  }

  #[test]
  fn test_no_magnitude_keeps_current() {
    assert_eq!(next_version(Some("1.2.3"), None).unwrap(), "1.2.3");
  }

  #[test]
  fn test_tag_prefixes_are_stripped() {
    assert_eq!(version_from_tag("v1.2.3"), "1.2.3");
    assert_eq!(version_from_tag("V1.2.3"), "1.2.3");
    assert_eq!(version_from_tag("version-1.2.3"), "1.2.3");
    assert_eq!(version_from_tag("Version1.2.3"), "1.2.3");
    assert_eq!(version_from_tag("1.2.3"), "1.2.3");
  }

  #[test]
  fn test_prefixed_current_version_bumps() {
    assert_eq!(next_version(Some("v1.2.3"), Some(Magnitude::Patch)).unwrap(), "1.2.4");
  }

  #[test]
  fn test_prerelease_and_build_are_dropped() {
    assert_eq!(
      next_version(Some("1.2.3-rc.1+build.5"), Some(Magnitude::Minor)).unwrap(),
      "1.3.0"
    );
  }

  #[test]
  fn test_short_version_is_rejected() {
    let err = next_version(Some("1.2"), Some(Magnitude::Patch)).unwrap_err();
    assert!(err.to_string().contains("1.2"));

    assert!(next_version(Some("1"), Some(Magnitude::Major)).is_err());
    assert!(next_version(Some("not-a-version"), None).is_err());
  }

  #[test]
  fn test_bump_resets_lower_components() {
    assert_eq!(next_version(Some("1.9.9"), Some(Magnitude::Minor)).unwrap(), "1.10.0");
    assert_eq!(next_version(Some("9.9.9"), Some(Magnitude::Major)).unwrap(), "10.0.0");
  }
}
