//! Integration tests for the tag workflow
//!
//! The local bare origin takes real tag pushes, so everything except the
//! optional hosting release publish runs end to end.

use crate::helpers::TestRepo;
use anyhow::Result;
use release_train::commands::tag::{run_at, TagOptions};

fn options(dry_run: bool) -> TagOptions {
  TagOptions {
    config_path: None,
    dry_run,
    verbose: false,
  }
}

/// Repo whose tip is a squash-merged release commit with version.txt present.
fn merged_release_repo(version: &str) -> Result<TestRepo> {
  let repo = TestRepo::new()?;
  repo.write_standard_config()?;
  repo.commit("feat: first")?;
  std::fs::write(repo.work.join("version.txt"), format!("{version}\n"))?;
  repo.commit(&format!("chore(main): update files for release {version}"))?;
  repo.push_main()?;
  Ok(repo)
}

#[test]
fn test_on_release_branch_fails_before_reading_version_marker() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_standard_config()?;
  repo.commit("feat: first")?;
  repo.checkout_new("release-train--branches--main")?;
  // No version.txt exists; the branch gate must fire first.

  let err = run_at(&repo.work, &options(false)).unwrap_err();
  let message = err.to_string();
  assert!(message.contains("release branch"), "got: {message}");
  assert!(!message.contains("version.txt"));
  Ok(())
}

#[test]
fn test_non_release_tip_commit_is_rejected() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_standard_config()?;
  repo.commit("feat: not a release merge")?;
  std::fs::write(repo.work.join("version.txt"), "1.0.0\n")?;

  let err = run_at(&repo.work, &options(false)).unwrap_err();
  assert!(err.to_string().contains("not a release request merge"), "got: {err}");
  Ok(())
}

#[test]
fn test_missing_version_marker_is_rejected() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_standard_config()?;
  repo.commit("chore(main): update files for release 1.0.0")?;

  let err = run_at(&repo.work, &options(false)).unwrap_err();
  assert!(err.to_string().contains("version.txt not found"), "got: {err}");
  Ok(())
}

#[test]
fn test_dry_run_creates_no_tag() -> Result<()> {
  let repo = merged_release_repo("1.0.0")?;

  run_at(&repo.work, &options(true))?;

  assert!(crate::helpers::git(&repo.work, &["tag", "--list"])?.is_empty());
  assert!(repo.origin_tags()?.is_empty());
  Ok(())
}

#[test]
fn test_tag_is_created_and_pushed_to_origin() -> Result<()> {
  let repo = merged_release_repo("1.2.3")?;

  run_at(&repo.work, &options(false))?;

  assert_eq!(crate::helpers::git(&repo.work, &["tag", "--list"])?, "1.2.3");
  assert_eq!(repo.origin_tags()?, "1.2.3");
  // Annotated tag with the release message
  let message = crate::helpers::git(&repo.work, &["tag", "-l", "-n1", "1.2.3"])?;
  assert!(message.contains("Release 1.2.3"));
  Ok(())
}

#[test]
fn test_existing_tag_is_rejected_with_recovery_help() -> Result<()> {
  let repo = merged_release_repo("1.2.3")?;
  run_at(&repo.work, &options(false))?;

  let err = run_at(&repo.work, &options(false)).unwrap_err();
  assert!(err.to_string().contains("already exists"), "got: {err}");
  assert!(err.help_message().unwrap_or_default().contains("git tag -d 1.2.3"));
  Ok(())
}

#[test]
fn test_remote_only_tag_is_still_detected() -> Result<()> {
  let repo = merged_release_repo("2.0.0")?;
  run_at(&repo.work, &options(false))?;

  // Remove the local tag; the remote check must still block re-tagging.
  crate::helpers::git(&repo.work, &["tag", "-d", "2.0.0"])?;

  let err = run_at(&repo.work, &options(false)).unwrap_err();
  assert!(err.to_string().contains("already exists"), "got: {err}");
  Ok(())
}
