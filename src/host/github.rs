//! GitHub REST provider

use super::{api_error_detail, GitHost, HostProvider, ReleaseData, ReleaseSpec, RequestData, RequestSpec, HTTP_TIMEOUT};
use crate::core::config::ReleaseConfig;
use crate::core::error::{ProviderError, ReleaseResult};
use regex::Regex;
use reqwest::blocking::{Client, Response};
use serde_json::json;
use std::env;

const API_ROOT: &str = "https://api.github.com";
const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";

fn github_error(message: impl Into<String>) -> ProviderError {
  ProviderError::GitHub { message: message.into() }
}

/// Resolve the GitHub token: environment variable first, then config.
pub fn resolve_token(config: &ReleaseConfig) -> ReleaseResult<String> {
  if let Ok(token) = env::var("GITHUB_TOKEN") {
    if !token.is_empty() {
      return Ok(token);
    }
  }

  if let Some(token) = config.github.token.clone() {
    return Ok(token);
  }

  Err(
    github_error(
      "GitHub token not found. Set GITHUB_TOKEN environment variable or add \
       'github.token' to the config file. The token needs 'repo' scope for \
       private repositories, 'public_repo' for public ones.",
    )
    .into(),
  )
}

/// Parse owner and repository name out of an origin remote URL.
pub fn parse_repo_identity(origin_url: &str) -> ReleaseResult<(String, String)> {
  let patterns = [
    r"^https://github\.com/([^/]+)/(.+?)(?:\.git)?$",
    r"^git@github\.com:([^/]+)/(.+?)(?:\.git)?$",
  ];

  for pattern in patterns {
    let re = Regex::new(pattern).map_err(|e| github_error(e.to_string()))?;
    if let Some(caps) = re.captures(origin_url) {
      return Ok((caps[1].to_string(), caps[2].to_string()));
    }
  }

  Err(github_error(format!("could not parse GitHub owner/repo from remote URL: {origin_url}")).into())
}

/// Pick the first open pull request number out of a list response.
pub fn first_open_request(body: &serde_json::Value) -> Option<u64> {
  body.as_array()?.first()?.get("number")?.as_u64()
}

pub struct GitHubProvider {
  owner: String,
  repo: String,
  token: String,
  client: Client,
}

impl GitHubProvider {
  pub fn new(origin_url: &str, config: &ReleaseConfig) -> ReleaseResult<Self> {
    let token = resolve_token(config)?;
    let (owner, repo) = parse_repo_identity(origin_url)?;
    let client = Client::builder()
      .timeout(HTTP_TIMEOUT)
      .user_agent("release-train")
      .build()
      .map_err(|e| github_error(format!("failed to build HTTP client: {e}")))?;

    Ok(Self { owner, repo, token, client })
  }

  fn check(&self, response: Response, action: &str) -> ReleaseResult<serde_json::Value> {
    let status = response.status();
    let body = response
      .text()
      .map_err(|e| github_error(format!("{action}: failed to read response: {e}")))?;

    if !status.is_success() {
      return Err(github_error(format!("{action}: HTTP {status} - {}", api_error_detail(&body))).into());
    }

    serde_json::from_str(&body)
      .map_err(|e| github_error(format!("{action}: invalid JSON response: {e}")).into())
  }

  fn find_open_request(&self, spec: &RequestSpec) -> ReleaseResult<Option<u64>> {
    let url = format!("{API_ROOT}/repos/{}/{}/pulls", self.owner, self.repo);
    let head = format!("{}:{}", self.owner, spec.source_branch);
    let response = self
      .client
      .get(&url)
      .header("Authorization", format!("token {}", self.token))
      .header("Accept", ACCEPT_HEADER)
      .query(&[
        ("state", "open"),
        ("head", head.as_str()),
        ("base", spec.target_branch.as_str()),
      ])
      .send()
      .map_err(|e| github_error(format!("failed to check for existing pull request: {e}")))?;

    let body = self.check(response, "failed to check for existing pull request")?;
    Ok(first_open_request(&body))
  }

  fn create_request(&self, spec: &RequestSpec) -> ReleaseResult<RequestData> {
    let url = format!("{API_ROOT}/repos/{}/{}/pulls", self.owner, self.repo);
    let payload = json!({
      "title": spec.title,
      "body": spec.body,
      "head": spec.source_branch,
      "base": spec.target_branch,
    });

    let response = self
      .client
      .post(&url)
      .header("Authorization", format!("token {}", self.token))
      .header("Accept", ACCEPT_HEADER)
      .json(&payload)
      .send()
      .map_err(|e| github_error(format!("failed to create pull request: {e}")))?;

    let body = self.check(response, "failed to create pull request")?;
    Ok(RequestData {
      id: body.get("number").and_then(|n| n.as_u64()).unwrap_or_default(),
      url: body.get("html_url").and_then(|u| u.as_str()).map(str::to_string),
      updated: false,
    })
  }

  fn update_request(&self, number: u64, spec: &RequestSpec) -> ReleaseResult<RequestData> {
    let url = format!("{API_ROOT}/repos/{}/{}/pulls/{number}", self.owner, self.repo);
    let payload = json!({
      "title": spec.title,
      "body": spec.body,
    });

    let response = self
      .client
      .patch(&url)
      .header("Authorization", format!("token {}", self.token))
      .header("Accept", ACCEPT_HEADER)
      .json(&payload)
      .send()
      .map_err(|e| github_error(format!("failed to update pull request: {e}")))?;

    let body = self.check(response, "failed to update pull request")?;
    Ok(RequestData {
      id: number,
      url: body.get("html_url").and_then(|u| u.as_str()).map(str::to_string),
      updated: true,
    })
  }
}

impl HostProvider for GitHubProvider {
  fn host(&self) -> GitHost {
    GitHost::GitHub
  }

  fn identity(&self) -> String {
    format!("{}/{}", self.owner, self.repo)
  }

  fn create_or_update_request(&self, spec: &RequestSpec) -> ReleaseResult<RequestData> {
    match self.find_open_request(spec)? {
      Some(number) => self.update_request(number, spec),
      None => self.create_request(spec),
    }
  }

  fn supports_release_publishing(&self) -> bool {
    true
  }

  fn publish_release(&self, release: &ReleaseSpec) -> ReleaseResult<ReleaseData> {
    let url = format!("{API_ROOT}/repos/{}/{}/releases", self.owner, self.repo);
    let payload = json!({
      "tag_name": release.tag_name,
      "name": release.name,
      "body": release.body,
      "draft": false,
      "prerelease": false,
    });

    let response = self
      .client
      .post(&url)
      .header("Authorization", format!("token {}", self.token))
      .header("Accept", ACCEPT_HEADER)
      .json(&payload)
      .send()
      .map_err(|e| github_error(format!("failed to create GitHub release: {e}")))?;

    let body = self.check(response, "failed to create GitHub release")?;
    Ok(ReleaseData {
      url: body.get("html_url").and_then(|u| u.as_str()).map(str::to_string),
    })
  }
}
