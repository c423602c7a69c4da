//! Commit message analysis for determining release magnitudes
//!
//! Parses conventional-commit subjects, upgrades breaking changes to a
//! synthetic `breaking` type, aggregates a commit list into the dominant
//! release magnitude, and recognises the tool's own release infrastructure
//! commits so they never feed back into the next release.

use crate::core::config::{Magnitude, ReleaseConfig};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Sentinel type for subjects that do not match conventional-commit grammar.
pub const UNKNOWN_TYPE: &str = "unknown";

/// Synthetic type assigned to breaking changes before rule lookup.
pub const BREAKING_TYPE: &str = "breaking";

/// A parsed conventional commit subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
  pub commit_type: String,
  pub scope: String,
  pub breaking: bool,
  pub description: String,
}

fn subject_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"^(?P<type>\w+)(?:\((?P<scope>[^)]+)\))?(?P<breaking>!)?\s*:\s*(?P<description>.+)$").unwrap())
}

/// Parse a commit message's first line as a conventional commit.
///
/// Non-matching messages come back with `commit_type == "unknown"` and the
/// trimmed message as the description.
pub fn parse_commit_message(message: &str) -> ParsedCommit {
  let subject = message.trim().lines().next().unwrap_or("");

  if let Some(caps) = subject_regex().captures(subject) {
    return ParsedCommit {
      commit_type: caps["type"].to_string(),
      scope: caps.name("scope").map(|m| m.as_str().to_string()).unwrap_or_default(),
      breaking: caps.name("breaking").is_some(),
      description: caps["description"].to_string(),
    };
  }

  ParsedCommit {
    commit_type: UNKNOWN_TYPE.to_string(),
    scope: String::new(),
    breaking: false,
    description: message.trim().to_string(),
  }
}

/// Whether a commit is a breaking change: `!` before the colon, or a
/// `BREAKING CHANGE:` / `BREAKING-CHANGE:` marker anywhere in the full
/// message (case-insensitive).
pub fn is_breaking_change(full_message: &str, parsed: &ParsedCommit) -> bool {
  if parsed.breaking {
    return true;
  }

  let upper = full_message.to_uppercase();
  upper.contains("BREAKING CHANGE:") || upper.contains("BREAKING-CHANGE:")
}

/// Effective type used for release-rule lookup: `breaking` wins over the
/// parsed type.
fn effective_type(message: &str, parsed: &ParsedCommit) -> String {
  if is_breaking_change(message, parsed) {
    BREAKING_TYPE.to_string()
  } else {
    parsed.commit_type.clone()
  }
}

/// Determine the dominant release magnitude for a list of commit messages.
///
/// Returns None when no commit maps to a configured rule. Scanning stops as
/// soon as a major classification is found.
pub fn analyse_commits(commit_messages: &[String], config: &ReleaseConfig) -> Option<Magnitude> {
  let mut highest: Option<Magnitude> = None;

  for message in commit_messages {
    let parsed = parse_commit_message(message);
    let commit_type = effective_type(message, &parsed);

    if let Some(magnitude) = config.release_rules.magnitude_for(&commit_type) {
      if highest.is_none_or(|h| magnitude > h) {
        highest = Some(magnitude);
      }
      if magnitude == Magnitude::Major {
        break;
      }
    }
  }

  highest
}

/// Count commits per effective type, for verbose output.
pub fn commit_type_summary(commit_messages: &[String]) -> BTreeMap<String, usize> {
  let mut summary = BTreeMap::new();

  for message in commit_messages {
    let parsed = parse_commit_message(message);
    let commit_type = effective_type(message, &parsed);
    *summary.entry(commit_type).or_insert(0) += 1;
  }

  summary
}

/// Whether a commit was created by the release workflow itself.
///
/// Matches three shapes: the merge commit of the release branch, a hosting
/// provider's squash-merge PR reference naming the release branch, and the
/// `chore(scope): [update files for ]release ...` commit (optionally wrapped
/// in an Azure DevOps `Merged PR N: ` prefix).
pub fn is_release_commit(commit_message: &str, release_branch_name: &str) -> bool {
  let escaped = regex::escape(release_branch_name);
  let patterns = [
    format!(r"Merge branch '{}' into", escaped),
    format!(r"Merge pull request #\d+ from [^/]+/{}", escaped),
    r"^(Merged PR \d+: )?chore\([^)]+\):\s+(update files for )?release".to_string(),
  ];

  patterns.iter().any(|pattern| {
    Regex::new(pattern)
      .map(|re| re.is_match(commit_message))
      .unwrap_or(false)
  })
}
