//! Command implementations
//!
//! One module per subcommand. The shared version plan (latest tag, filtered
//! commits, magnitude, next version) is computed here so `next-version` and
//! `release` cannot drift apart.

pub mod next_version;
pub mod release;
pub mod tag;

use crate::analyser;
use crate::core::config::{Magnitude, ReleaseConfig};
use crate::core::error::{ReleaseResult, WorkflowError};
use crate::core::vcs::SystemGit;
use crate::version;

/// Everything derived from commit history that release planning needs.
#[derive(Debug)]
pub struct VersionPlan {
  pub latest_tag: Option<String>,
  pub current_version: Option<String>,
  /// Commit subjects since the latest tag, release-infrastructure commits
  /// already filtered out.
  pub commits: Vec<String>,
  pub magnitude: Option<Magnitude>,
  pub next_version: String,
  pub next_version_prefixed: String,
}

/// Read commit history and compute the next version.
///
/// Fails when there are no commits at all, when only release-infrastructure
/// commits remain (the merged release has not been tagged yet), or when no
/// commit maps to a release rule.
pub fn compute_version_plan(git: &SystemGit, config: &ReleaseConfig) -> ReleaseResult<VersionPlan> {
  let latest_tag = git.latest_tag()?;
  let current_version = latest_tag.as_deref().map(version::version_from_tag);

  let all_commits = git.commit_subjects_since(latest_tag.as_deref())?;
  if all_commits.is_empty() {
    return Err(WorkflowError::new("no commits since last release").into());
  }

  let release_branch = config.release_branch_name();
  let commits: Vec<String> = all_commits
    .into_iter()
    .filter(|c| !analyser::is_release_commit(c, &release_branch))
    .collect();

  if commits.is_empty() {
    return Err(
      WorkflowError::new("only release infrastructure commits found since last tag")
        .with_help("Run 'release-train tag-release' to tag the merged release.")
        .into(),
    );
  }

  let magnitude = analyser::analyse_commits(&commits, config);
  if magnitude.is_none() {
    return Err(WorkflowError::new("no releasable commits found").into());
  }

  let next = version::next_version(current_version.as_deref(), magnitude)?;
  let next_prefixed = format!("{}{}", config.version_prefix, next);

  Ok(VersionPlan {
    latest_tag,
    current_version,
    commits,
    magnitude,
    next_version: next,
    next_version_prefixed: next_prefixed,
  })
}
