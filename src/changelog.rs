//! Changelog rendering and file maintenance
//!
//! Groups classified commits into configured sections, renders a markdown
//! entry for a release, prepends entries to CHANGELOG.md, and extracts the
//! entry for a given version back out of the file.

use crate::analyser::{self, ParsedCommit};
use crate::core::config::ReleaseConfig;
use chrono::Local;
use std::collections::BTreeMap;

const CHANGELOG_TITLE: &str = "# Changelog";

const CHANGELOG_PREAMBLE: &str = "# Changelog\n\nAll notable changes to this project will be documented in this file.\n\nThis project adheres to [Semantic Versioning](https://semver.org/spec/v2.0.0.html).\n";

/// Commits grouped by commit type, preserving the order commits arrived in.
fn group_commits(commit_messages: &[String]) -> BTreeMap<String, Vec<ParsedCommit>> {
  let mut groups: BTreeMap<String, Vec<ParsedCommit>> = BTreeMap::new();

  for message in commit_messages {
    let parsed = analyser::parse_commit_message(message);
    groups.entry(parsed.commit_type.clone()).or_default().push(parsed);
  }

  groups
}

fn render_bullet(commit: &ParsedCommit) -> String {
  if commit.scope.is_empty() {
    format!("* {}", commit.description)
  } else {
    format!("* **{}**: {}", commit.scope, commit.description)
  }
}

/// Render the changelog entry for one release.
///
/// Sections appear in config order. Several commit types mapping to the same
/// section title are merged under the first occurrence. Types without a
/// configured section are omitted.
pub fn render_entry(version: &str, commit_messages: &[String], config: &ReleaseConfig) -> String {
  let date = Local::now().format("%Y-%m-%d");
  let mut entry = format!("## [{}] ({})\n", version, date);

  let groups = group_commits(commit_messages);

  let mut seen_titles: Vec<String> = Vec::new();
  for section in &config.changelog_sections {
    if seen_titles.iter().any(|t| t == &section.section) {
      continue;
    }

    // Collect every configured type that shares this section title, in
    // config order, so merged sections keep a stable bullet order.
    let types_for_title: Vec<&str> = config
      .changelog_sections
      .iter()
      .filter(|s| s.section == section.section)
      .map(|s| s.commit_type.as_str())
      .collect();

    let mut bullets = Vec::new();
    for commit_type in types_for_title {
      if let Some(commits) = groups.get(commit_type) {
        bullets.extend(commits.iter().map(render_bullet));
      }
    }

    if !bullets.is_empty() {
      entry.push_str(&format!("\n### {}\n\n", section.section));
      for bullet in bullets {
        entry.push_str(&bullet);
        entry.push('\n');
      }
    }

    seen_titles.push(section.section.clone());
  }

  entry
}

/// Prepend a release entry to existing changelog content.
///
/// When the content already starts with a `# Changelog` title the entry is
/// inserted after the preamble, before the first existing `## ` heading.
/// An empty document gets a fresh preamble; any other content is kept and
/// the entry goes on top of it.
pub fn prepend_entry(existing: &str, entry: &str) -> String {
  let entry = entry.trim_end();

  if existing.trim().is_empty() {
    return format!("{}\n{}\n", CHANGELOG_PREAMBLE, entry);
  }

  if !existing.trim_start().starts_with(CHANGELOG_TITLE) {
    return format!("{entry}\n\n{existing}");
  }

  match existing.find("\n## ") {
    Some(pos) => {
      let (head, tail) = existing.split_at(pos);
      format!("{}\n\n{}\n{}", head.trim_end(), entry, tail)
    }
    None => format!("{}\n\n{}\n", existing.trim_end(), entry),
  }
}

/// Extract the changelog entry body for a version from full changelog
/// content.
///
/// Returns None when the version has no entry. Matching is on the heading
/// prefix, so the date suffix does not need to be known. The `## [version]`
/// heading itself is excluded: the body doubles as a release description
/// published under a title that already names the version.
pub fn extract_entry(content: &str, version: &str) -> Option<String> {
  let heading_prefix = format!("## [{}]", version);

  let mut entry_lines: Vec<&str> = Vec::new();
  let mut in_entry = false;

  for line in content.lines() {
    if in_entry {
      if line.starts_with("## ") {
        break;
      }
      if entry_lines.is_empty() && line.trim().is_empty() {
        continue;
      }
      entry_lines.push(line);
    } else if line.starts_with(&heading_prefix) {
      in_entry = true;
    }
  }

  if !in_entry {
    return None;
  }

  while entry_lines.last().is_some_and(|l| l.trim().is_empty()) {
    entry_lines.pop();
  }

  Some(entry_lines.join("\n"))
}
