//! `tag-release` - tag a merged release and optionally publish it
//!
//! Runs after the release request has been merged into the source branch.
//! Gates run in order: not on the release branch, tip commit is a release
//! commit, version marker present, tag not already there. Publishing the
//! hosting release afterwards is best-effort and only ever warns.

use crate::analyser;
use crate::changelog;
use crate::core::config::ReleaseConfig;
use crate::core::error::{ReleaseResult, WorkflowError};
use crate::core::vcs::SystemGit;
use crate::host::{self, ReleaseSpec};
use std::fs;
use std::path::Path;

pub struct TagOptions {
  pub config_path: Option<String>,
  pub dry_run: bool,
  pub verbose: bool,
}

pub fn run(options: &TagOptions) -> ReleaseResult<()> {
  run_at(Path::new("."), options)
}

/// Run the tag workflow for the repository containing `dir`.
pub fn run_at(dir: &Path, options: &TagOptions) -> ReleaseResult<()> {
  let git = SystemGit::open(dir)?;
  let config_file = match &options.config_path {
    Some(path) => Path::new(path).to_path_buf(),
    None => ReleaseConfig::default_path(&git.root),
  };
  let config = ReleaseConfig::load(&config_file)?;
  git.configure_identity(&config.git.user_name, &config.git.user_email)?;

  let release_branch = config.release_branch_name();

  // Gate: not on the release branch
  let current_branch = git.current_branch()?;
  if current_branch == release_branch {
    return Err(
      WorkflowError::new(format!("cannot create tag from release branch '{release_branch}'"))
        .with_help("Merge the release request first and run from the source branch.")
        .into(),
    );
  }

  // Gate: tip commit is a release commit
  let latest_commit = git.latest_commit_subject()?;
  if !analyser::is_release_commit(&latest_commit, &release_branch) {
    return Err(
      WorkflowError::new(format!(
        "cannot create release tag: latest commit is not a release request merge.\n\n\
         Latest commit message:\n  {latest_commit}\n\n\
         Expected pattern (squash merge):\n  chore({}): update files for release X.Y.Z\n\n\
         Or pattern (merge commit):\n  Merge branch '{release_branch}' into {}",
        config.source_branch, config.source_branch
      ))
      .with_help(
        "The tag-release command runs after merging a release request:\n  \
         1. Run: release-train release\n  \
         2. Review and merge the release request\n  \
         3. Run: release-train tag-release\n\
         To create a tag manually, use 'git tag' directly.",
      )
      .into(),
    );
  }

  // Gate: version marker present and non-empty
  let version_file = git.root.join("version.txt");
  if !version_file.exists() {
    return Err(
      WorkflowError::new("version.txt not found")
        .with_help("Run 'release-train release' and merge the release request before tagging.")
        .into(),
    );
  }
  let version = fs::read_to_string(&version_file)?.trim().to_string();
  if version.is_empty() {
    return Err(WorkflowError::new("version.txt is empty").into());
  }

  // Gate: tag not already present
  if git.tag_exists(&version)? {
    return Err(
      WorkflowError::new(format!("tag '{version}' already exists"))
        .with_help(format!(
          "To recreate the tag, delete it first with: git tag -d {version} && git push origin :refs/tags/{version}"
        ))
        .into(),
    );
  }

  if options.verbose || options.dry_run {
    println!("Current branch: {current_branch}");
    println!("Version from version.txt: {version}");
    println!("Tag to create: {version}");
  }

  if options.dry_run {
    println!("\nWould create annotated tag '{version}'");
    println!("Would push tag to origin");
    return Ok(());
  }

  if options.verbose {
    println!("\nCreating tag '{version}'...");
  }
  git.create_tag(&version, &format!("Release {version}"))?;

  if options.verbose {
    println!("Pushing tag to origin...");
  }
  git.push_tag(&version)?;

  // Optional publish. The tag is the durable side effect; any failure from
  // here on is reported as a warning, never as a workflow failure.
  let release_url = match publish_release(&git, &config, &version, options.verbose) {
    Ok(url) => url,
    Err(err) => {
      println!("⚠️  Failed to publish release: {err}");
      None
    }
  };

  println!("\n✅ Tag created and pushed: {version}");
  println!("✅ Branch: {current_branch}");
  if let Some(url) = release_url {
    println!("✅ Release: {url}");
  }

  Ok(())
}

/// Publish a hosting release for the freshly pushed tag, when the detected
/// provider supports release resources.
fn publish_release(
  git: &SystemGit,
  config: &ReleaseConfig,
  version: &str,
  verbose: bool,
) -> ReleaseResult<Option<String>> {
  let origin_url = git.origin_url()?;
  let Some(git_host) = host::GitHost::detect(&origin_url) else {
    return Ok(None);
  };

  let provider = host::provider_for(git_host, &origin_url, config)?;
  if !provider.supports_release_publishing() {
    return Ok(None);
  }

  // The changelog records bare versions while version.txt carries the
  // configured prefix.
  let bare_version = version
    .strip_prefix(&config.version_prefix)
    .filter(|_| !config.version_prefix.is_empty())
    .unwrap_or(version);

  let changelog_file = git.root.join(&config.changelog_path);
  let body = fs::read_to_string(&changelog_file)
    .ok()
    .and_then(|content| changelog::extract_entry(&content, bare_version))
    .unwrap_or_else(|| format!("Release {version}"));

  if verbose {
    println!("\nCreating {git_host} release for {version}...");
  }

  let release = provider.publish_release(&ReleaseSpec {
    tag_name: version.to_string(),
    name: version.to_string(),
    body,
  })?;

  if verbose {
    if let Some(url) = &release.url {
      println!("✅ {git_host} release created: {url}");
    }
  }

  Ok(release.url)
}
