//! System git backend - zero dependencies
//!
//! Shells out to the git executable for every operation. Each call is a
//! separate synchronous subprocess with an isolated environment (only PATH
//! and HOME are inherited), so the user's global git config cannot change
//! behaviour mid-workflow.

use crate::core::error::{GitError, ReleaseError, ReleaseResult};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git backend using system git (zero crate dependencies)
#[derive(Debug)]
pub struct SystemGit {
  /// Working tree root
  pub root: PathBuf,
}

impl SystemGit {
  /// Open the git repository containing `path`.
  ///
  /// One subprocess call resolves the working tree root; missing-git and
  /// not-a-repository surface as distinct errors.
  pub fn open(path: &Path) -> ReleaseResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ReleaseError::Git(GitError::GitNotFound),
        _ => ReleaseError::Io(e),
      })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(ReleaseError::Git(GitError::NotARepository));
      }
      return Err(ReleaseError::Git(GitError::CommandFailed {
        command: "git rev-parse --show-toplevel".to_string(),
        stderr: stderr.trim().to_string(),
      }));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(Self {
      root: PathBuf::from(stdout.trim()),
    })
  }

  /// Create a safe git command with isolated environment
  fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.root);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false");

    cmd
  }

  /// Run a git subcommand, mapping non-zero exit to `GitError::CommandFailed`.
  fn run(&self, args: &[&str]) -> ReleaseResult<String> {
    let output = self.git_cmd().args(args).output().map_err(|e| match e.kind() {
      std::io::ErrorKind::NotFound => ReleaseError::Git(GitError::GitNotFound),
      _ => ReleaseError::Io(e),
    })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ReleaseError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: stderr.trim().to_string(),
      }));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Run a git subcommand where a non-zero exit is an expected outcome.
  fn run_status(&self, args: &[&str]) -> ReleaseResult<(bool, String)> {
    let output = self.git_cmd().args(args).output().map_err(|e| match e.kind() {
      std::io::ErrorKind::NotFound => ReleaseError::Git(GitError::GitNotFound),
      _ => ReleaseError::Io(e),
    })?;

    Ok((
      output.status.success(),
      String::from_utf8_lossy(&output.stdout).trim().to_string(),
    ))
  }

  /// Configure the repo-scoped git identity used for release commits.
  pub fn configure_identity(&self, user_name: &str, user_email: &str) -> ReleaseResult<()> {
    self.run(&["config", "user.name", user_name])?;
    self.run(&["config", "user.email", user_email])?;
    Ok(())
  }

  /// Latest tag reachable from HEAD, or None if no tags exist.
  pub fn latest_tag(&self) -> ReleaseResult<Option<String>> {
    let (ok, stdout) = self.run_status(&["describe", "--tags", "--abbrev=0"])?;
    if ok && !stdout.is_empty() { Ok(Some(stdout)) } else { Ok(None) }
  }

  /// Commit subjects since a tag (all commits when tag is None), newest first.
  pub fn commit_subjects_since(&self, tag: Option<&str>) -> ReleaseResult<Vec<String>> {
    let range = match tag {
      Some(tag) => format!("{}..HEAD", tag),
      None => "HEAD".to_string(),
    };

    let output = self.run(&["log", &range, "--pretty=format:%s"])?;
    if output.is_empty() {
      return Ok(vec![]);
    }
    Ok(output.lines().map(|s| s.to_string()).collect())
  }

  /// Subject of the tip commit.
  pub fn latest_commit_subject(&self) -> ReleaseResult<String> {
    self.run(&["log", "-1", "--pretty=format:%s"])
  }

  /// Current branch name; detached HEAD is an error.
  pub fn current_branch(&self) -> ReleaseResult<String> {
    let branch = self.run(&["branch", "--show-current"])?;
    if branch.is_empty() {
      return Err(ReleaseError::Git(GitError::DetachedHead));
    }
    Ok(branch)
  }

  /// URL of the `origin` remote.
  pub fn origin_url(&self) -> ReleaseResult<String> {
    self.run(&["remote", "get-url", "origin"])
  }

  /// Fetch all refs from `origin`.
  pub fn fetch_origin(&self) -> ReleaseResult<()> {
    self.run(&["fetch", "origin"])?;
    Ok(())
  }

  /// Force create or reset a branch to exactly match `origin/{source}`.
  ///
  /// `checkout -B` discards any prior divergent state of the branch, so
  /// repeated runs never accumulate merge conflicts.
  pub fn reset_branch_to_origin(&self, branch: &str, source_branch: &str) -> ReleaseResult<()> {
    let start_point = format!("origin/{}", source_branch);
    self.run(&["checkout", "-B", branch, &start_point])?;
    Ok(())
  }

  /// Stage everything and commit; returns false (no commit) when the staged
  /// diff is empty.
  pub fn stage_all_and_commit(&self, message: &str) -> ReleaseResult<bool> {
    self.run(&["add", "-A"])?;

    let (clean, _) = self.run_status(&["diff", "--cached", "--quiet"])?;
    if clean {
      return Ok(false);
    }

    self.run(&["commit", "-m", message])?;
    Ok(true)
  }

  /// Force-push a branch to origin.
  pub fn force_push_branch(&self, branch: &str) -> ReleaseResult<()> {
    self.run(&["push", "-f", "origin", branch])?;
    Ok(())
  }

  /// Checkout an existing branch.
  pub fn checkout(&self, branch: &str) -> ReleaseResult<()> {
    self.run(&["checkout", branch])?;
    Ok(())
  }

  /// Whether a tag exists locally or on origin.
  pub fn tag_exists(&self, tag: &str) -> ReleaseResult<bool> {
    let local_ref = format!("refs/tags/{}", tag);
    let (local, _) = self.run_status(&["show-ref", "--verify", &local_ref])?;
    if local {
      return Ok(true);
    }

    let (ok, stdout) = self.run_status(&["ls-remote", "--tags", "origin", tag])?;
    Ok(ok && !stdout.is_empty())
  }

  /// Create an annotated tag.
  pub fn create_tag(&self, tag: &str, message: &str) -> ReleaseResult<()> {
    self.run(&["tag", "-a", tag, "-m", message])?;
    Ok(())
  }

  /// Push a tag to origin.
  pub fn push_tag(&self, tag: &str) -> ReleaseResult<()> {
    self.run(&["push", "origin", tag])?;
    Ok(())
  }
}
