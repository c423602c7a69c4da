//! Integration tests for the release workflow
//!
//! Provider-shaped origin URLs are parsed but never contacted: the dry-run
//! tests exit before any network call, and the failure tests break on the
//! unresolvable fetch before the request reconciliation step.

use crate::helpers::TestRepo;
use anyhow::Result;
use release_train::commands::release::{run_at, ReleaseOptions};

fn options(dry_run: bool, git_host: Option<&str>) -> ReleaseOptions {
  ReleaseOptions {
    config_path: None,
    dry_run,
    verbose: false,
    git_host: git_host.map(str::to_string),
  }
}

fn config_with_gitlab_token() -> &'static str {
  "release-rules:\n  minor:\n    - feat\n  patch:\n    - fix\ngitlab:\n  token: glpat-test\n"
}

#[test]
fn test_dry_run_validates_credentials_and_mutates_nothing() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config(config_with_gitlab_token())?;
  repo.commit("feat: add widget")?;
  repo.set_origin_url("https://gitlab.example.com/group/app.git")?;

  run_at(&repo.work, &options(true, None))?;

  assert!(!repo.work.join("CHANGELOG.md").exists());
  assert!(!repo.work.join("version.txt").exists());
  assert_eq!(repo.current_branch()?, "main");
  Ok(())
}

#[test]
fn test_dry_run_fails_without_credentials() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config("release-rules:\n  minor:\n    - feat\n")?;
  repo.commit("feat: add widget")?;
  repo.set_origin_url("https://gitlab.example.com/group/app.git")?;

  // Only meaningful when the variable is absent from the environment.
  if std::env::var("GITLAB_TOKEN").is_ok() {
    return Ok(());
  }

  let err = run_at(&repo.work, &options(true, None)).unwrap_err();
  assert!(err.to_string().contains("validation failed"), "got: {err}");
  Ok(())
}

#[test]
fn test_undetectable_host_fails_before_mutation() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_standard_config()?;
  repo.commit("feat: add widget")?;
  // origin still points at the local bare repo, which matches no provider

  let err = run_at(&repo.work, &options(false, None)).unwrap_err();
  assert!(err.to_string().contains("could not detect git hosting provider"), "got: {err}");
  assert!(!repo.work.join("version.txt").exists());
  Ok(())
}

#[test]
fn test_explicit_host_override_rejects_mismatched_origin() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config("release-rules:\n  minor:\n    - feat\ngithub:\n  token: ghp-test\n")?;
  repo.commit("feat: add widget")?;
  repo.set_origin_url("https://gitlab.example.com/group/app.git")?;

  let err = run_at(&repo.work, &options(true, Some("github"))).unwrap_err();
  assert!(err.to_string().contains("GitHub"), "got: {err}");
  Ok(())
}

#[test]
fn test_failed_fetch_leaves_working_tree_on_source_branch() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_config(config_with_gitlab_token())?;
  repo.commit("feat: add widget")?;
  // Parseable as GitLab but never resolvable, so the mutate phase fails at
  // the fetch and the workflow must still end up back on main.
  repo.set_origin_url("https://gitlab.invalid/group/app.git")?;

  let err = run_at(&repo.work, &options(false, None)).unwrap_err();
  assert!(err.to_string().contains("fetch"), "got: {err}");
  assert_eq!(repo.current_branch()?, "main");
  Ok(())
}

#[test]
fn test_invalid_tag_arity_is_a_version_error() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write_standard_config()?;
  repo.commit("feat: first")?;
  repo.tag("v1.2")?;
  repo.commit("feat: second")?;

  let err = run_at(&repo.work, &options(true, None)).unwrap_err();
  assert!(err.to_string().contains("invalid version"), "got: {err}");
  Ok(())
}
