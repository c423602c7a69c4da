//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A working repository wired to a local bare origin, so fetch/push paths
/// run for real without any network.
pub struct TestRepo {
  _root: TempDir,
  pub work: PathBuf,
  pub origin: PathBuf,
}

impl TestRepo {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let origin = root.path().join("origin.git");
    let work = root.path().join("work");

    git(root.path(), &["init", "--bare", "--initial-branch=main", "origin.git"])?;

    std::fs::create_dir(&work)?;
    git(&work, &["init", "--initial-branch=main"])?;
    git(&work, &["config", "user.name", "Test User"])?;
    git(&work, &["config", "user.email", "test@example.com"])?;
    git(&work, &["remote", "add", "origin", origin.to_str().context("origin path")?])?;

    Ok(Self { _root: root, work, origin })
  }

  /// Write the release-train.yaml used by the workflows.
  pub fn write_config(&self, yaml: &str) -> Result<()> {
    std::fs::write(self.work.join("release-train.yaml"), yaml)?;
    Ok(())
  }

  /// Standard config with feat/fix/breaking rules and no extra files.
  pub fn write_standard_config(&self) -> Result<()> {
    self.write_config(
      "release-rules:\n  major:\n    - breaking\n  minor:\n    - feat\n  patch:\n    - fix\n    - chore\n",
    )
  }

  /// Commit a change to a throwaway file with the given message.
  pub fn commit(&self, message: &str) -> Result<()> {
    let marker = self.work.join("notes.txt");
    let mut content = std::fs::read_to_string(&marker).unwrap_or_default();
    content.push_str(message);
    content.push('\n');
    std::fs::write(&marker, content)?;
    git(&self.work, &["add", "-A"])?;
    git(&self.work, &["commit", "-m", message])?;
    Ok(())
  }

  pub fn tag(&self, name: &str) -> Result<()> {
    git(&self.work, &["tag", "-a", name, "-m", name])?;
    Ok(())
  }

  pub fn push_main(&self) -> Result<()> {
    git(&self.work, &["push", "-u", "origin", "main"])?;
    Ok(())
  }

  pub fn current_branch(&self) -> Result<String> {
    git(&self.work, &["branch", "--show-current"])
  }

  pub fn checkout_new(&self, branch: &str) -> Result<()> {
    git(&self.work, &["checkout", "-b", branch])?;
    Ok(())
  }

  /// Replace the origin remote URL, e.g. with a provider-shaped URL that is
  /// never contacted.
  pub fn set_origin_url(&self, url: &str) -> Result<()> {
    git(&self.work, &["remote", "set-url", "origin", url])?;
    Ok(())
  }

  /// Tags present in the bare origin repository.
  pub fn origin_tags(&self) -> Result<String> {
    git(&self.origin, &["tag", "--list"])
  }
}

/// Run a git command in `dir`, returning trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> Result<String> {
  let output = Command::new("git")
    .current_dir(dir)
    .args(args)
    .output()
    .with_context(|| format!("running git {}", args.join(" ")))?;

  if !output.status.success() {
    anyhow::bail!(
      "git {} failed: {}",
      args.join(" "),
      String::from_utf8_lossy(&output.stderr)
    );
  }

  Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
