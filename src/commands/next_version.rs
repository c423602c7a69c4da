//! `next-version` - print the version the next release would get

use crate::analyser;
use crate::commands::compute_version_plan;
use crate::core::config::ReleaseConfig;
use crate::core::error::ReleaseResult;
use crate::core::vcs::SystemGit;
use crate::version::FIRST_VERSION;
use std::path::Path;

pub struct NextVersionOptions {
  pub config_path: Option<String>,
  pub verbose: bool,
}

/// Analyse commit history and print the next version, prefixed, on the last
/// line so scripts can capture it.
pub fn run(options: &NextVersionOptions) -> ReleaseResult<()> {
  let git = SystemGit::open(Path::new("."))?;
  let config_file = match &options.config_path {
    Some(path) => Path::new(path).to_path_buf(),
    None => ReleaseConfig::default_path(&git.root),
  };
  let config = ReleaseConfig::load(&config_file)?;

  let plan = compute_version_plan(&git, &config)?;

  if options.verbose {
    match &plan.current_version {
      Some(current) => println!("Current version: {current}"),
      None => {
        println!("No tags found in repository");
        println!("Will use first release: {FIRST_VERSION}");
      }
    }

    println!("\nFound {} commits since last release", plan.commits.len());

    println!("\nCommit summary:");
    for (commit_type, count) in analyser::commit_type_summary(&plan.commits) {
      match config.release_rules.magnitude_for(&commit_type) {
        Some(magnitude) => println!("  {commit_type}: {count} ({} bump)", magnitude.as_str()),
        None => println!("  {commit_type}: {count} (no bump)"),
      }
    }

    if let Some(magnitude) = plan.magnitude {
      println!("\nDetermined release magnitude: {}", magnitude.as_str());
    }

    match &plan.current_version {
      Some(current) => println!("Version bump: {current} -> {}", plan.next_version),
      None => println!("First release version: {}", plan.next_version),
    }
    println!();
  }

  println!("{}", plan.next_version_prefixed);
  Ok(())
}
