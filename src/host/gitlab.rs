//! GitLab REST v4 provider
//!
//! Works against gitlab.com and self-hosted instances. The project path is
//! URL-segment-encoded so nested group paths address the project endpoint
//! directly.

use super::{api_error_detail, GitHost, HostProvider, ReleaseData, ReleaseSpec, RequestData, RequestSpec, HTTP_TIMEOUT};
use crate::core::config::ReleaseConfig;
use crate::core::error::{ProviderError, ReleaseResult};
use regex::Regex;
use reqwest::blocking::{Client, Response};
use serde_json::json;
use std::env;

fn gitlab_error(message: impl Into<String>) -> ProviderError {
  ProviderError::GitLab { message: message.into() }
}

/// Resolve the GitLab token: environment variable first, then config.
pub fn resolve_token(config: &ReleaseConfig) -> ReleaseResult<String> {
  if let Ok(token) = env::var("GITLAB_TOKEN") {
    if !token.is_empty() {
      return Ok(token);
    }
  }

  if let Some(token) = config.gitlab.token.clone() {
    return Ok(token);
  }

  Err(
    gitlab_error(
      "GitLab token not found. Set GITLAB_TOKEN environment variable or add \
       'gitlab.token' to the config file. The token needs 'api' scope.",
    )
    .into(),
  )
}

/// Parse the instance host and full project path out of an origin URL.
///
/// Any host works as long as it contains "gitlab"; nested group paths are
/// kept whole.
pub fn parse_repo_identity(origin_url: &str) -> ReleaseResult<(String, String)> {
  let patterns = [
    r"^https://([^/]+)/(.+?)(?:\.git)?$",
    r"^git@([^:]+):(.+?)(?:\.git)?$",
  ];

  for pattern in patterns {
    let re = Regex::new(pattern).map_err(|e| gitlab_error(e.to_string()))?;
    if let Some(caps) = re.captures(origin_url) {
      let host = caps[1].to_string();
      if host.to_lowercase().contains("gitlab") {
        return Ok((host, caps[2].to_string()));
      }
    }
  }

  Err(
    gitlab_error(format!(
      "could not parse GitLab host/project from remote URL: {origin_url}. \
       Expected a GitLab URL such as https://gitlab.com/owner/repo.git"
    ))
    .into(),
  )
}

/// Percent-encode a project path for use as a single URL segment.
pub fn encode_project_path(path: &str) -> String {
  let mut encoded = String::with_capacity(path.len());
  for byte in path.bytes() {
    match byte {
      b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
        encoded.push(byte as char);
      }
      other => encoded.push_str(&format!("%{other:02X}")),
    }
  }
  encoded
}

/// Pick the first opened merge request iid out of a list response.
pub fn first_open_request(body: &serde_json::Value) -> Option<u64> {
  body.as_array()?.first()?.get("iid")?.as_u64()
}

pub struct GitLabProvider {
  host: String,
  project_path: String,
  token: String,
  client: Client,
}

impl GitLabProvider {
  pub fn new(origin_url: &str, config: &ReleaseConfig) -> ReleaseResult<Self> {
    let token = resolve_token(config)?;
    let (host, project_path) = parse_repo_identity(origin_url)?;
    let client = Client::builder()
      .timeout(HTTP_TIMEOUT)
      .user_agent("release-train")
      .build()
      .map_err(|e| gitlab_error(format!("failed to build HTTP client: {e}")))?;

    Ok(Self { host, project_path, token, client })
  }

  fn project_url(&self) -> String {
    format!(
      "https://{}/api/v4/projects/{}",
      self.host,
      encode_project_path(&self.project_path)
    )
  }

  fn check(&self, response: Response, action: &str) -> ReleaseResult<serde_json::Value> {
    let status = response.status();
    let body = response
      .text()
      .map_err(|e| gitlab_error(format!("{action}: failed to read response: {e}")))?;

    if !status.is_success() {
      return Err(gitlab_error(format!("{action}: HTTP {status} - {}", api_error_detail(&body))).into());
    }

    serde_json::from_str(&body)
      .map_err(|e| gitlab_error(format!("{action}: invalid JSON response: {e}")).into())
  }

  fn find_open_request(&self, spec: &RequestSpec) -> ReleaseResult<Option<u64>> {
    let response = self
      .client
      .get(format!("{}/merge_requests", self.project_url()))
      .header("PRIVATE-TOKEN", &self.token)
      .query(&[
        ("state", "opened"),
        ("source_branch", spec.source_branch.as_str()),
        ("target_branch", spec.target_branch.as_str()),
      ])
      .send()
      .map_err(|e| gitlab_error(format!("failed to check for existing merge request: {e}")))?;

    let body = self.check(response, "failed to check for existing merge request")?;
    Ok(first_open_request(&body))
  }

  fn create_request(&self, spec: &RequestSpec) -> ReleaseResult<RequestData> {
    let payload = json!({
      "source_branch": spec.source_branch,
      "target_branch": spec.target_branch,
      "title": spec.title,
      "description": spec.body,
    });

    let response = self
      .client
      .post(format!("{}/merge_requests", self.project_url()))
      .header("PRIVATE-TOKEN", &self.token)
      .json(&payload)
      .send()
      .map_err(|e| gitlab_error(format!("failed to create merge request: {e}")))?;

    let body = self.check(response, "failed to create merge request")?;
    Ok(RequestData {
      id: body.get("iid").and_then(|n| n.as_u64()).unwrap_or_default(),
      url: body.get("web_url").and_then(|u| u.as_str()).map(str::to_string),
      updated: false,
    })
  }

  fn update_request(&self, iid: u64, spec: &RequestSpec) -> ReleaseResult<RequestData> {
    let payload = json!({
      "title": spec.title,
      "description": spec.body,
    });

    let response = self
      .client
      .put(format!("{}/merge_requests/{iid}", self.project_url()))
      .header("PRIVATE-TOKEN", &self.token)
      .json(&payload)
      .send()
      .map_err(|e| gitlab_error(format!("failed to update merge request: {e}")))?;

    let body = self.check(response, "failed to update merge request")?;
    Ok(RequestData {
      id: iid,
      url: body.get("web_url").and_then(|u| u.as_str()).map(str::to_string),
      updated: true,
    })
  }
}

impl HostProvider for GitLabProvider {
  fn host(&self) -> GitHost {
    GitHost::GitLab
  }

  fn identity(&self) -> String {
    format!("{}/{}", self.host, self.project_path)
  }

  fn create_or_update_request(&self, spec: &RequestSpec) -> ReleaseResult<RequestData> {
    match self.find_open_request(spec)? {
      Some(iid) => self.update_request(iid, spec),
      None => self.create_request(spec),
    }
  }

  fn supports_release_publishing(&self) -> bool {
    true
  }

  fn publish_release(&self, release: &ReleaseSpec) -> ReleaseResult<ReleaseData> {
    let payload = json!({
      "tag_name": release.tag_name,
      "name": release.name,
      "description": release.body,
    });

    let response = self
      .client
      .post(format!("{}/releases", self.project_url()))
      .header("PRIVATE-TOKEN", &self.token)
      .json(&payload)
      .send()
      .map_err(|e| gitlab_error(format!("failed to create GitLab release: {e}")))?;

    let body = self.check(response, "failed to create GitLab release")?;
    Ok(ReleaseData {
      url: body.get("_links").and_then(|l| l.get("self")).and_then(|u| u.as_str()).map(str::to_string),
    })
  }
}
