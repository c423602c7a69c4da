//! Hosting provider abstraction
//!
//! Three providers (GitHub, Azure DevOps, GitLab) behind one capability set:
//! resolve credentials, parse the origin remote URL into a repo identity,
//! reconcile an open pull/merge request, and publish a release for a tag.
//! Providers never retry; each network failure surfaces as a typed error
//! carrying the API's own message where one is obtainable.

mod azure;
mod github;
mod gitlab;

pub use azure::AzureDevOpsProvider;
pub use github::GitHubProvider;
pub use gitlab::GitLabProvider;

use crate::core::config::ReleaseConfig;
use crate::core::error::{ReleaseError, ReleaseResult, WorkflowError};
use std::fmt;
use std::time::Duration;

/// Client-side timeout applied to every provider API call.
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// The hosting providers recognised from an origin remote URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHost {
  GitHub,
  AzureDevOps,
  GitLab,
}

impl GitHost {
  /// Detect the provider from an origin remote URL by host substring.
  pub fn detect(origin_url: &str) -> Option<GitHost> {
    let url = origin_url.to_lowercase();
    if url.contains("github.com") {
      Some(GitHost::GitHub)
    } else if url.contains("dev.azure.com") || url.contains("visualstudio.com") {
      Some(GitHost::AzureDevOps)
    } else if url.contains("gitlab") {
      Some(GitHost::GitLab)
    } else {
      None
    }
  }

  /// Parse an explicit `--git-host` override.
  pub fn from_name(name: &str) -> ReleaseResult<GitHost> {
    match name.to_lowercase().as_str() {
      "github" => Ok(GitHost::GitHub),
      "azure" => Ok(GitHost::AzureDevOps),
      "gitlab" => Ok(GitHost::GitLab),
      other => Err(
        WorkflowError::new(format!("unknown git host '{other}'"))
          .with_help("Supported hosts: github, azure, gitlab")
          .into(),
      ),
    }
  }
}

impl fmt::Display for GitHost {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitHost::GitHub => write!(f, "GitHub"),
      GitHost::AzureDevOps => write!(f, "Azure DevOps"),
      GitHost::GitLab => write!(f, "GitLab"),
    }
  }
}

/// Everything needed to open or refresh a hosting request.
#[derive(Debug, Clone)]
pub struct RequestSpec {
  pub title: String,
  pub body: String,
  pub source_branch: String,
  pub target_branch: String,
}

/// Identifying fields of a created or updated hosting request.
#[derive(Debug, Clone)]
pub struct RequestData {
  pub id: u64,
  pub url: Option<String>,
  pub updated: bool,
}

/// A release resource to attach to an existing tag.
#[derive(Debug, Clone)]
pub struct ReleaseSpec {
  pub tag_name: String,
  pub name: String,
  pub body: String,
}

/// Result of publishing a release.
#[derive(Debug, Clone)]
pub struct ReleaseData {
  pub url: Option<String>,
}

/// Common capability set implemented by every hosting provider.
///
/// Constructing a provider resolves credentials and parses the repo identity,
/// so orchestrators can validate both before touching the working tree.
pub trait HostProvider {
  fn host(&self) -> GitHost;

  /// Human-readable repo identity, for verbose and dry-run output.
  fn identity(&self) -> String;

  /// Find the open request for the branch pair, update it if present,
  /// otherwise create one. Several open requests for the same pair resolve
  /// to the first the API returns.
  fn create_or_update_request(&self, spec: &RequestSpec) -> ReleaseResult<RequestData>;

  /// Whether the provider has a release resource to publish after tagging.
  fn supports_release_publishing(&self) -> bool;

  /// Publish a non-draft release attached to an existing tag.
  fn publish_release(&self, release: &ReleaseSpec) -> ReleaseResult<ReleaseData>;
}

/// Build the provider for a host, validating credentials and repo identity.
pub fn provider_for(
  host: GitHost,
  origin_url: &str,
  config: &ReleaseConfig,
) -> ReleaseResult<Box<dyn HostProvider>> {
  match host {
    GitHost::GitHub => Ok(Box::new(GitHubProvider::new(origin_url, config)?)),
    GitHost::AzureDevOps => Ok(Box::new(AzureDevOpsProvider::new(origin_url, config)?)),
    GitHost::GitLab => Ok(Box::new(GitLabProvider::new(origin_url, config)?)),
  }
}

/// Resolve the host to use: explicit override first, else URL detection.
pub fn resolve_host(override_name: Option<&str>, origin_url: &str) -> ReleaseResult<GitHost> {
  if let Some(name) = override_name {
    return GitHost::from_name(name);
  }

  GitHost::detect(origin_url).ok_or_else(|| {
    ReleaseError::from(
      WorkflowError::new(format!(
        "could not detect git hosting provider from remote URL: {origin_url}"
      ))
      .with_help(
        "Supported providers: github.com, dev.azure.com, gitlab. \
         Use --git-host to specify the provider explicitly: --git-host github|azure|gitlab",
      ),
    )
  })
}

/// Extract the API's own error message from a response body, falling back to
/// a trimmed snippet of the raw body.
pub(crate) fn api_error_detail(body: &str) -> String {
  if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(body) {
    if let Some(message) = parsed.get("message").and_then(|m| m.as_str()) {
      return message.to_string();
    }
  }

  let trimmed = body.trim();
  if trimmed.len() > 200 {
    // Back off to a char boundary so multi-byte bodies cannot split a char.
    let mut end = 200;
    while !trimmed.is_char_boundary(end) {
      end -= 1;
    }
    format!("{}...", &trimmed[..end])
  } else {
    trimmed.to_string()
  }
}
