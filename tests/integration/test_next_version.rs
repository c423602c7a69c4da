//! Integration tests for version planning against real git history

use crate::helpers::TestRepo;
use anyhow::Result;
use release_train::commands::compute_version_plan;
use release_train::core::config::{Magnitude, ReleaseConfig};
use release_train::core::vcs::SystemGit;

fn load(repo: &TestRepo) -> Result<(SystemGit, ReleaseConfig)> {
  let git = SystemGit::open(&repo.work)?;
  let config = ReleaseConfig::load(&ReleaseConfig::default_path(&git.root))?;
  Ok((git, config))
}

#[test]
fn test_first_release_is_0_1_0_regardless_of_magnitude() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_standard_config()?;
  repo.commit("feat: x")?;
  repo.commit("fix: y")?;

  let (git, config) = load(&repo)?;
  let plan = compute_version_plan(&git, &config)?;

  assert_eq!(plan.latest_tag, None);
  assert_eq!(plan.next_version, "0.1.0");
  assert_eq!(plan.commits.len(), 2);
  Ok(())
}

#[test]
fn test_breaking_commit_bumps_major_from_tag() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_standard_config()?;
  repo.commit("chore: setup")?;
  repo.tag("v1.4.2")?;
  repo.commit("fix: a")?;
  repo.commit("feat: b")?;
  repo.commit("feat!: c")?;

  let (git, config) = load(&repo)?;
  let plan = compute_version_plan(&git, &config)?;

  assert_eq!(plan.latest_tag.as_deref(), Some("v1.4.2"));
  assert_eq!(plan.current_version.as_deref(), Some("1.4.2"));
  assert_eq!(plan.magnitude, Some(Magnitude::Major));
  assert_eq!(plan.next_version, "2.0.0");
  Ok(())
}

#[test]
fn test_only_infrastructure_commits_is_distinct_error() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_standard_config()?;
  repo.commit("feat: first")?;
  repo.tag("v1.0.0")?;
  repo.commit("chore(main): update files for release 1.1.0")?;

  let (git, config) = load(&repo)?;
  let err = compute_version_plan(&git, &config).unwrap_err();

  let message = err.to_string();
  assert!(message.contains("only release infrastructure commits"), "got: {message}");
  assert!(!message.contains("no releasable commits"));
  Ok(())
}

#[test]
fn test_no_commits_since_tag_fails() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_standard_config()?;
  repo.commit("feat: first")?;
  repo.tag("v1.0.0")?;

  let (git, config) = load(&repo)?;
  let err = compute_version_plan(&git, &config).unwrap_err();
  assert!(err.to_string().contains("no commits since last release"));
  Ok(())
}

#[test]
fn test_unmapped_commits_only_fails_as_not_releasable() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config("release-rules:\n  minor:\n    - feat\n")?;
  repo.commit("feat: first")?;
  repo.tag("v1.0.0")?;
  repo.commit("docs: only documentation")?;

  let (git, config) = load(&repo)?;
  let err = compute_version_plan(&git, &config).unwrap_err();
  assert!(err.to_string().contains("no releasable commits"));
  Ok(())
}
