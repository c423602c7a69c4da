//! `release` - cut or refresh a release branch and its hosting request
//!
//! Linear state machine: load, determine version, resolve host (credentials
//! validated before any mutation), render artifacts, then mutate the release
//! branch, push, and reconcile the pull/merge request. The working tree is
//! restored to the source branch on every exit path after mutation starts.

use crate::bumper;
use crate::changelog;
use crate::commands::{compute_version_plan, VersionPlan};
use crate::core::config::ReleaseConfig;
use crate::core::error::{ReleaseError, ReleaseResult, WorkflowError};
use crate::core::vcs::SystemGit;
use crate::host::{self, HostProvider, RequestSpec};
use std::fs;
use std::path::Path;

pub struct ReleaseOptions {
  pub config_path: Option<String>,
  pub dry_run: bool,
  pub verbose: bool,
  pub git_host: Option<String>,
}

pub fn run(options: &ReleaseOptions) -> ReleaseResult<()> {
  run_at(Path::new("."), options)
}

/// Run the release workflow for the repository containing `dir`.
pub fn run_at(dir: &Path, options: &ReleaseOptions) -> ReleaseResult<()> {
  // Load
  let git = SystemGit::open(dir)?;
  let config_file = match &options.config_path {
    Some(path) => Path::new(path).to_path_buf(),
    None => ReleaseConfig::default_path(&git.root),
  };
  let config = ReleaseConfig::load(&config_file)?;
  git.configure_identity(&config.git.user_name, &config.git.user_email)?;

  // Determine version
  let plan = compute_version_plan(&git, &config)?;
  let release_branch = config.release_branch_name();

  // Resolve host and validate credentials before touching anything,
  // dry-run included.
  let origin_url = git.origin_url()?;
  let git_host = host::resolve_host(options.git_host.as_deref(), &origin_url)?;
  let provider = host::provider_for(git_host, &origin_url, &config).map_err(|e| {
    ReleaseError::from(WorkflowError::new(format!(
      "{git_host} detected but validation failed: {e}"
    )))
  })?;

  // Render artifacts
  let changelog_entry = changelog::render_entry(&plan.next_version, &plan.commits, &config);
  let request_title = format!("chore({}): release {}", config.source_branch, plan.next_version);
  let commit_message = format!(
    "chore({}): update files for release {}",
    config.source_branch, plan.next_version
  );

  if options.verbose || options.dry_run {
    print_plan(&config, &plan, &release_branch, options.verbose);
  }

  if options.dry_run {
    println!("\nWould force-reset branch '{release_branch}' from '{}'", config.source_branch);
    println!("Would update {} extra files", config.extra_files.len());
    println!("Would update {}", config.changelog_path);
    println!("Would update version.txt");
    println!("Would commit: {commit_message}");
    println!("Would force-push to origin/{release_branch}");
    println!("\nWould create/update {git_host} request for {}:", provider.identity());
    println!("  Title: {request_title}");
    println!("  Head: {release_branch}");
    println!("  Base: {}", config.source_branch);
    println!("  Body:\n{changelog_entry}");
    return Ok(());
  }

  let spec = RequestSpec {
    title: request_title,
    body: changelog_entry.clone(),
    source_branch: release_branch.clone(),
    target_branch: config.source_branch.clone(),
  };

  // Mutation happens in a helper so the checkout back to the source branch
  // runs on failure paths too.
  let outcome = mutate_and_reconcile(
    &git,
    &config,
    &plan,
    &release_branch,
    &changelog_entry,
    &commit_message,
    provider.as_ref(),
    &spec,
    options.verbose,
  );

  if options.verbose {
    println!("\nSwitching back to '{}'...", config.source_branch);
  }
  let restored = git.checkout(&config.source_branch);

  outcome?;
  restored?;

  println!("\n✅ Release branch created/updated: {release_branch}");
  println!("✅ Version: {}", plan.next_version_prefixed);
  println!("✅ Switched back to: {}", config.source_branch);

  Ok(())
}

fn print_plan(config: &ReleaseConfig, plan: &VersionPlan, release_branch: &str, verbose: bool) {
  println!("Source branch: {}", config.source_branch);
  println!("Release branch: {release_branch}");
  println!("Current version: {}", plan.current_version.as_deref().unwrap_or("none"));
  println!("Next version: {}", plan.next_version_prefixed);
  if let Some(magnitude) = plan.magnitude {
    println!("Release magnitude: {}", magnitude.as_str());
  }
  println!("\nCommits to include: {}", plan.commits.len());

  if verbose {
    for (commit_type, count) in crate::analyser::commit_type_summary(&plan.commits) {
      println!("  {commit_type}: {count}");
    }
  }
}

#[allow(clippy::too_many_arguments)]
fn mutate_and_reconcile(
  git: &SystemGit,
  config: &ReleaseConfig,
  plan: &VersionPlan,
  release_branch: &str,
  changelog_entry: &str,
  commit_message: &str,
  provider: &dyn HostProvider,
  spec: &RequestSpec,
  verbose: bool,
) -> ReleaseResult<()> {
  if verbose {
    println!("\nCreating/resetting release branch '{release_branch}'...");
  }
  git.fetch_origin()?;
  git.reset_branch_to_origin(release_branch, &config.source_branch)?;

  if verbose {
    println!("Updating changelog file...");
  }
  let changelog_file = git.root.join(&config.changelog_path);
  let existing = if changelog_file.exists() {
    fs::read_to_string(&changelog_file)?
  } else {
    String::new()
  };
  fs::write(&changelog_file, changelog::prepend_entry(&existing, changelog_entry))?;

  fs::write(git.root.join("version.txt"), format!("{}\n", plan.next_version_prefixed))?;
  if verbose {
    println!("Updated version.txt");
  }

  if !config.extra_files.is_empty() {
    if verbose {
      println!("Bumping version in {} files...", config.extra_files.len());
    }
    let outcome = bumper::bump_all(&config.extra_files, &plan.next_version, &git.root, false);
    if outcome.has_errors() {
      return Err(
        WorkflowError::new(format!("file bumping errors: {}", outcome.errors.join("; "))).into(),
      );
    }
    if verbose {
      for updated in &outcome.updated {
        println!("  ✅ {updated}");
      }
    }
  }

  if verbose {
    println!("\nCommitting changes...");
  }
  let committed = git.stage_all_and_commit(commit_message)?;
  if !committed && verbose {
    println!("No changes to commit, branch already up to date");
  }

  if verbose {
    println!("Pushing to origin/{release_branch}...");
  }
  git.force_push_branch(release_branch)?;

  if verbose {
    println!("\nCreating/updating {} request...", provider.host());
  }
  let request = provider.create_or_update_request(spec)?;
  let verb = if request.updated { "updated" } else { "created" };
  println!("\n✅ Request {verb}: #{}", request.id);
  if let Some(url) = &request.url {
    println!("  {url}");
  }

  Ok(())
}
