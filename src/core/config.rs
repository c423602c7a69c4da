//! Release configuration (release-train.yaml) parsing and validation
//!
//! The whole run is driven by one immutable `ReleaseConfig` loaded once at
//! startup and passed by reference to every component. Keys are kebab-case in
//! the YAML file.

use crate::core::error::{ConfigError, ReleaseResult, ResultExt};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name, resolved against the repository root.
pub const DEFAULT_CONFIG_FILE: &str = "release-train.yaml";

/// Release magnitude: which semantic-version component to increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Magnitude {
  // Ordering matters: Patch < Minor < Major.
  Patch,
  Minor,
  Major,
}

impl Magnitude {
  pub fn as_str(self) -> &'static str {
    match self {
      Magnitude::Major => "major",
      Magnitude::Minor => "minor",
      Magnitude::Patch => "patch",
    }
  }
}

/// Mapping from magnitude to the commit types that trigger it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseRules {
  #[serde(default)]
  pub major: Vec<String>,
  #[serde(default)]
  pub minor: Vec<String>,
  #[serde(default)]
  pub patch: Vec<String>,
}

impl ReleaseRules {
  /// Look up the magnitude for a commit type, checking major first.
  ///
  /// A type listed under two magnitudes resolves to the higher one;
  /// configurations should not do that.
  pub fn magnitude_for(&self, commit_type: &str) -> Option<Magnitude> {
    if self.major.iter().any(|t| t == commit_type) {
      return Some(Magnitude::Major);
    }
    if self.minor.iter().any(|t| t == commit_type) {
      return Some(Magnitude::Minor);
    }
    if self.patch.iter().any(|t| t == commit_type) {
      return Some(Magnitude::Patch);
    }
    None
  }

  fn is_empty(&self) -> bool {
    self.major.is_empty() && self.minor.is_empty() && self.patch.is_empty()
  }
}

/// A changelog section mapping: commits of `commit_type` render under `section`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangelogSection {
  #[serde(rename = "type")]
  pub commit_type: String,
  pub section: String,
}

/// An extra file whose version string is bumped alongside the changelog.
///
/// `kind` stays a free-form string so that unknown formats surface as
/// per-entry bump errors rather than config load failures.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtraFile {
  #[serde(rename = "type", default)]
  pub kind: Option<String>,
  #[serde(default)]
  pub path: Option<String>,
  #[serde(rename = "yaml-path", default)]
  pub yaml_path: Option<String>,
  #[serde(rename = "toml-path", default)]
  pub toml_path: Option<String>,
  #[serde(rename = "json-path", default)]
  pub json_path: Option<String>,
  #[serde(rename = "use-prefix", default)]
  pub use_prefix: Option<String>,
}

/// Git identity used for release commits.
#[derive(Debug, Clone, Deserialize)]
pub struct GitIdentity {
  #[serde(rename = "user-name", default = "default_git_user_name")]
  pub user_name: String,
  #[serde(rename = "user-email", default = "default_git_user_email")]
  pub user_email: String,
}

fn default_git_user_name() -> String {
  "Release Train Bot".to_string()
}

fn default_git_user_email() -> String {
  "release-train@users.noreply.github.com".to_string()
}

impl Default for GitIdentity {
  fn default() -> Self {
    Self {
      user_name: default_git_user_name(),
      user_email: default_git_user_email(),
    }
  }
}

/// Per-provider credential override (token read from config when the
/// environment variable is unset).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderCredentials {
  #[serde(default)]
  pub token: Option<String>,
}

/// Release configuration loaded from release-train.yaml; immutable for the run.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseConfig {
  #[serde(rename = "release-rules")]
  pub release_rules: ReleaseRules,

  #[serde(rename = "version-prefix", default)]
  pub version_prefix: String,

  #[serde(rename = "changelog-path", default = "default_changelog_path")]
  pub changelog_path: String,

  #[serde(rename = "changelog-sections", default = "default_changelog_sections")]
  pub changelog_sections: Vec<ChangelogSection>,

  #[serde(rename = "extra-files", default)]
  pub extra_files: Vec<ExtraFile>,

  #[serde(rename = "source-branch", default = "default_source_branch")]
  pub source_branch: String,

  #[serde(rename = "release-branch-name", default)]
  release_branch_name: Option<String>,

  #[serde(default)]
  pub git: GitIdentity,

  #[serde(default)]
  pub github: ProviderCredentials,

  #[serde(default)]
  pub azure: ProviderCredentials,

  #[serde(default)]
  pub gitlab: ProviderCredentials,
}

fn default_changelog_path() -> String {
  "CHANGELOG.md".to_string()
}

fn default_source_branch() -> String {
  "main".to_string()
}

fn default_changelog_sections() -> Vec<ChangelogSection> {
  let section = |commit_type: &str, section: &str| ChangelogSection {
    commit_type: commit_type.to_string(),
    section: section.to_string(),
  };
  vec![
    section("feat", "Features"),
    section("fix", "Bug Fixes"),
    section("chore", "Miscellaneous Changes"),
    section("ci", "Miscellaneous Changes"),
    section("docs", "Documentation"),
    section("refactor", "Code Refactoring"),
  ]
}

impl ReleaseConfig {
  /// Load and validate configuration from a YAML file.
  pub fn load(path: &Path) -> ReleaseResult<Self> {
    if !path.exists() {
      return Err(
        ConfigError::NotFound {
          path: path.to_path_buf(),
        }
        .into(),
      );
    }

    let content =
      fs::read_to_string(path).with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: ReleaseConfig = serde_yaml::from_str(&content)?;

    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> ReleaseResult<()> {
    if self.release_rules.is_empty() {
      return Err(
        ConfigError::Invalid {
          message: "'release-rules' must contain at least one of: major, minor, patch".to_string(),
        }
        .into(),
      );
    }
    Ok(())
  }

  /// Release branch name: configured value, or generated from the source branch.
  pub fn release_branch_name(&self) -> String {
    match &self.release_branch_name {
      Some(name) => name.clone(),
      None => format!("release-train--branches--{}", self.source_branch),
    }
  }

  /// Default config path for a repository root.
  pub fn default_path(repo_root: &Path) -> PathBuf {
    repo_root.join(DEFAULT_CONFIG_FILE)
  }
}
