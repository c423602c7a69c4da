//! Azure DevOps REST provider
//!
//! Uses the 7.1 pull-request API with basic auth (empty username, PAT as
//! password). Azure has no release resource in this capability set, so
//! publishing is reported as unsupported.

use super::{api_error_detail, GitHost, HostProvider, ReleaseData, ReleaseSpec, RequestData, RequestSpec, HTTP_TIMEOUT};
use crate::core::config::ReleaseConfig;
use crate::core::error::{ProviderError, ReleaseResult};
use regex::Regex;
use reqwest::blocking::{Client, Response};
use serde_json::json;
use std::env;

const API_VERSION: &str = "7.1";

fn azure_error(message: impl Into<String>) -> ProviderError {
  ProviderError::AzureDevOps { message: message.into() }
}

/// Resolve the Azure DevOps PAT: environment variable first, then config.
pub fn resolve_token(config: &ReleaseConfig) -> ReleaseResult<String> {
  if let Ok(token) = env::var("AZURE_DEVOPS_TOKEN") {
    if !token.is_empty() {
      return Ok(token);
    }
  }

  if let Some(token) = config.azure.token.clone() {
    return Ok(token);
  }

  Err(
    azure_error(
      "Azure DevOps token not found. Set AZURE_DEVOPS_TOKEN environment variable \
       or add 'azure.token' to the config file. Create a Personal Access Token \
       with 'Code (Read & Write)' scope at https://dev.azure.com/{org}/_usersSettings/tokens",
    )
    .into(),
  )
}

/// Parse organisation, project, and repository name out of an origin URL.
///
/// Accepts the dev.azure.com HTTPS form (with or without a user@ prefix),
/// the v3 SSH form, and the legacy visualstudio.com form.
pub fn parse_repo_identity(origin_url: &str) -> ReleaseResult<(String, String, String)> {
  let patterns = [
    r"^https://(?:[^@]+@)?dev\.azure\.com/([^/]+)/([^/]+)/_git/(.+?)(?:\.git)?$",
    r"^git@ssh\.dev\.azure\.com:v3/([^/]+)/([^/]+)/(.+?)(?:\.git)?$",
    r"^https://([^.]+)\.visualstudio\.com/([^/]+)/_git/(.+?)(?:\.git)?$",
  ];

  for pattern in patterns {
    let re = Regex::new(pattern).map_err(|e| azure_error(e.to_string()))?;
    if let Some(caps) = re.captures(origin_url) {
      return Ok((caps[1].to_string(), caps[2].to_string(), caps[3].to_string()));
    }
  }

  Err(
    azure_error(format!(
      "could not parse Azure DevOps org/project/repo from remote URL: {origin_url}"
    ))
    .into(),
  )
}

/// Pick the first active pull request id out of a list response.
pub fn first_open_request(body: &serde_json::Value) -> Option<u64> {
  body.get("value")?.as_array()?.first()?.get("pullRequestId")?.as_u64()
}

pub struct AzureDevOpsProvider {
  organisation: String,
  project: String,
  repo: String,
  token: String,
  client: Client,
}

impl AzureDevOpsProvider {
  pub fn new(origin_url: &str, config: &ReleaseConfig) -> ReleaseResult<Self> {
    let token = resolve_token(config)?;
    let (organisation, project, repo) = parse_repo_identity(origin_url)?;
    let client = Client::builder()
      .timeout(HTTP_TIMEOUT)
      .user_agent("release-train")
      .build()
      .map_err(|e| azure_error(format!("failed to build HTTP client: {e}")))?;

    Ok(Self { organisation, project, repo, token, client })
  }

  fn requests_url(&self) -> String {
    format!(
      "https://dev.azure.com/{}/{}/_apis/git/repositories/{}/pullrequests",
      self.organisation, self.project, self.repo
    )
  }

  fn check(&self, response: Response, action: &str) -> ReleaseResult<serde_json::Value> {
    let status = response.status();
    let body = response
      .text()
      .map_err(|e| azure_error(format!("{action}: failed to read response: {e}")))?;

    if !status.is_success() {
      return Err(azure_error(format!("{action}: HTTP {status} - {}", api_error_detail(&body))).into());
    }

    serde_json::from_str(&body)
      .map_err(|e| azure_error(format!("{action}: invalid JSON response: {e}")).into())
  }

  fn find_open_request(&self, spec: &RequestSpec) -> ReleaseResult<Option<u64>> {
    let source_ref = format!("refs/heads/{}", spec.source_branch);
    let target_ref = format!("refs/heads/{}", spec.target_branch);
    let response = self
      .client
      .get(self.requests_url())
      .basic_auth("", Some(&self.token))
      .query(&[
        ("searchCriteria.status", "active"),
        ("searchCriteria.sourceRefName", source_ref.as_str()),
        ("searchCriteria.targetRefName", target_ref.as_str()),
        ("api-version", API_VERSION),
      ])
      .send()
      .map_err(|e| azure_error(format!("failed to check for existing pull request: {e}")))?;

    let body = self.check(response, "failed to check for existing pull request")?;
    Ok(first_open_request(&body))
  }

  fn create_request(&self, spec: &RequestSpec) -> ReleaseResult<RequestData> {
    let payload = json!({
      "sourceRefName": format!("refs/heads/{}", spec.source_branch),
      "targetRefName": format!("refs/heads/{}", spec.target_branch),
      "title": spec.title,
      "description": spec.body,
    });

    let response = self
      .client
      .post(self.requests_url())
      .basic_auth("", Some(&self.token))
      .query(&[("api-version", API_VERSION)])
      .json(&payload)
      .send()
      .map_err(|e| azure_error(format!("failed to create pull request: {e}")))?;

    let body = self.check(response, "failed to create pull request")?;
    Ok(RequestData {
      id: body.get("pullRequestId").and_then(|n| n.as_u64()).unwrap_or_default(),
      url: body.get("url").and_then(|u| u.as_str()).map(str::to_string),
      updated: false,
    })
  }

  fn update_request(&self, id: u64, spec: &RequestSpec) -> ReleaseResult<RequestData> {
    let payload = json!({
      "title": spec.title,
      "description": spec.body,
    });

    let response = self
      .client
      .patch(format!("{}/{id}", self.requests_url()))
      .basic_auth("", Some(&self.token))
      .query(&[("api-version", API_VERSION)])
      .json(&payload)
      .send()
      .map_err(|e| azure_error(format!("failed to update pull request: {e}")))?;

    let body = self.check(response, "failed to update pull request")?;
    Ok(RequestData {
      id,
      url: body.get("url").and_then(|u| u.as_str()).map(str::to_string),
      updated: true,
    })
  }
}

impl HostProvider for AzureDevOpsProvider {
  fn host(&self) -> GitHost {
    GitHost::AzureDevOps
  }

  fn identity(&self) -> String {
    format!("{}/{}/{}", self.organisation, self.project, self.repo)
  }

  fn create_or_update_request(&self, spec: &RequestSpec) -> ReleaseResult<RequestData> {
    match self.find_open_request(spec)? {
      Some(id) => self.update_request(id, spec),
      None => self.create_request(spec),
    }
  }

  fn supports_release_publishing(&self) -> bool {
    false
  }

  fn publish_release(&self, _release: &ReleaseSpec) -> ReleaseResult<ReleaseData> {
    Err(azure_error("release publishing is not supported for Azure DevOps").into())
  }
}
