//! Version bumping for configured extra files
//!
//! Dispatches on file format: YAML/TOML/JSON documents addressed by a dotted
//! JSONPath locator, or free-text files with marker-delimited blocks. Every
//! entry is processed independently and failures are collected, never raised.

use crate::core::config::ExtraFile;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use toml_edit::DocumentMut;

/// Literal marker strings recognised by the generic bumper. Kept compatible
/// with documents annotated for contiamo-release-please.
pub const BUMP_START_MARKER: &str = "contiamo-release-please-bump-start";
pub const BUMP_END_MARKER: &str = "contiamo-release-please-bump-end";

/// Aggregate result of a bump run across all configured extra files.
#[derive(Debug, Default)]
pub struct BumpOutcome {
  pub updated: Vec<String>,
  pub errors: Vec<String>,
}

impl BumpOutcome {
  pub fn has_errors(&self) -> bool {
    !self.errors.is_empty()
  }
}

fn version_token_regex() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"v?\d+\.\d+\.\d+").unwrap())
}

/// Split a `$.a.b.c` locator into its key segments.
///
/// Only the dotted-key subset of JSONPath is supported; wildcard and index
/// syntax are reported as unsupported.
fn parse_locator(locator: &str) -> Result<Vec<&str>, String> {
  let Some(stripped) = locator.strip_prefix("$.") else {
    return Err(format!("unsupported locator '{locator}': expected a '$.'-prefixed dotted path"));
  };

  let segments: Vec<&str> = stripped.split('.').collect();
  if segments.iter().any(|s| s.is_empty() || s.contains(['[', ']', '*'])) {
    return Err(format!("unsupported locator '{locator}': only dotted keys are supported"));
  }

  Ok(segments)
}

fn bump_yaml(path: &Path, locator: &str, value: &str) -> Result<(), String> {
  let segments = parse_locator(locator)?;
  let content =
    fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
  let mut data: serde_yaml::Value = serde_yaml::from_str(&content)
    .map_err(|e| format!("YAML parsing error in {}: {}", path.display(), e))?;

  let mut current = &mut data;
  for segment in &segments[..segments.len() - 1] {
    current = current
      .get_mut(*segment)
      .ok_or_else(|| format!("path '{}' not found in {}", locator, path.display()))?;
  }
  let last = segments[segments.len() - 1];
  let slot = current
    .get_mut(last)
    .ok_or_else(|| format!("path '{}' not found in {}", locator, path.display()))?;
  *slot = serde_yaml::Value::String(value.to_string());

  let rendered =
    serde_yaml::to_string(&data).map_err(|e| format!("failed to render {}: {}", path.display(), e))?;
  fs::write(path, rendered).map_err(|e| format!("failed to write {}: {}", path.display(), e))
}

fn bump_toml(path: &Path, locator: &str, value: &str) -> Result<(), String> {
  let segments = parse_locator(locator)?;
  let content =
    fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
  let mut doc: DocumentMut = content
    .parse()
    .map_err(|e| format!("TOML parsing error in {}: {}", path.display(), e))?;

  let mut current = doc.as_item_mut();
  for segment in &segments[..segments.len() - 1] {
    current = current
      .get_mut(*segment)
      .ok_or_else(|| format!("path '{}' not found in {}", locator, path.display()))?;
  }
  let last = segments[segments.len() - 1];
  let slot = current
    .get_mut(last)
    .ok_or_else(|| format!("path '{}' not found in {}", locator, path.display()))?;
  *slot = toml_edit::value(value);

  fs::write(path, doc.to_string()).map_err(|e| format!("failed to write {}: {}", path.display(), e))
}

fn bump_json(path: &Path, locator: &str, value: &str) -> Result<(), String> {
  let segments = parse_locator(locator)?;
  let content =
    fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
  let mut data: serde_json::Value = serde_json::from_str(&content)
    .map_err(|e| format!("JSON parsing error in {}: {}", path.display(), e))?;

  let mut current = &mut data;
  for segment in &segments[..segments.len() - 1] {
    current = current
      .get_mut(*segment)
      .ok_or_else(|| format!("path '{}' not found in {}", locator, path.display()))?;
  }
  let last = segments[segments.len() - 1];
  let slot = current
    .get_mut(last)
    .ok_or_else(|| format!("path '{}' not found in {}", locator, path.display()))?;
  *slot = serde_json::Value::String(value.to_string());

  let rendered = serde_json::to_string_pretty(&data)
    .map_err(|e| format!("failed to render {}: {}", path.display(), e))?;
  fs::write(path, rendered + "\n").map_err(|e| format!("failed to write {}: {}", path.display(), e))
}

/// Replace every version-shaped token inside marker-delimited blocks.
///
/// Returns the rewritten content and the replacement count. Zero blocks or
/// zero tokens inside the blocks found is an error.
fn rewrite_marker_blocks(content: &str, value: &str) -> Result<(String, usize), String> {
  let mut lines: Vec<String> = Vec::new();
  let mut in_block = false;
  let mut blocks = 0;
  let mut replaced = 0;

  for line in content.lines() {
    if !in_block && line.contains(BUMP_START_MARKER) {
      in_block = true;
      blocks += 1;
      lines.push(line.to_string());
    } else if in_block && line.contains(BUMP_END_MARKER) {
      in_block = false;
      lines.push(line.to_string());
    } else if in_block {
      let matches = version_token_regex().find_iter(line).count();
      if matches > 0 {
        replaced += matches;
        lines.push(version_token_regex().replace_all(line, value).into_owned());
      } else {
        lines.push(line.to_string());
      }
    } else {
      lines.push(line.to_string());
    }
  }

  if blocks == 0 {
    return Err(format!("no '{BUMP_START_MARKER}' marker blocks found"));
  }
  if replaced == 0 {
    return Err("no version tokens found between bump markers".to_string());
  }

  let mut rewritten = lines.join("\n");
  if content.ends_with('\n') {
    rewritten.push('\n');
  }
  Ok((rewritten, replaced))
}

fn bump_generic(path: &Path, value: &str) -> Result<(), String> {
  let content =
    fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
  let (rewritten, _) = rewrite_marker_blocks(&content, value)?;
  fs::write(path, rewritten).map_err(|e| format!("failed to write {}: {}", path.display(), e))
}

fn locator_for(entry: &ExtraFile, kind: &str, path: &str) -> Result<Option<String>, String> {
  match kind {
    "yaml" => entry
      .yaml_path
      .clone()
      .map(Some)
      .ok_or_else(|| format!("missing 'yaml-path' for YAML file: {path}")),
    "toml" => entry
      .toml_path
      .clone()
      .map(Some)
      .ok_or_else(|| format!("missing 'toml-path' for TOML file: {path}")),
    "json" => entry
      .json_path
      .clone()
      .map(Some)
      .ok_or_else(|| format!("missing 'json-path' for JSON file: {path}")),
    "generic" => Ok(None),
    other => Err(format!("unsupported file type: {other}")),
  }
}

/// Apply a version to every configured extra file.
///
/// Each entry is validated and bumped independently. Failures are collected
/// into `errors` and never abort the batch. With `dry_run` set nothing is
/// written but the would-be updates are still reported, so write-time errors
/// stay invisible in dry-run.
pub fn bump_all(entries: &[ExtraFile], version: &str, base_dir: &Path, dry_run: bool) -> BumpOutcome {
  let mut outcome = BumpOutcome::default();

  for entry in entries {
    let Some(kind) = entry.kind.as_deref() else {
      outcome.errors.push("missing 'type' field in extra-files entry".to_string());
      continue;
    };
    let Some(rel_path) = entry.path.as_deref() else {
      outcome.errors.push("missing 'path' field in extra-files entry".to_string());
      continue;
    };

    let locator = match locator_for(entry, kind, rel_path) {
      Ok(locator) => locator,
      Err(message) => {
        outcome.errors.push(message);
        continue;
      }
    };

    let value = match entry.use_prefix.as_deref() {
      Some(prefix) if !prefix.is_empty() => format!("{prefix}{version}"),
      _ => version.to_string(),
    };

    let file_path = base_dir.join(rel_path);
    if !file_path.exists() {
      outcome.errors.push(format!("file not found: {}", file_path.display()));
      continue;
    }

    let applied = if dry_run {
      Ok(())
    } else {
      match (kind, &locator) {
        ("yaml", Some(locator)) => bump_yaml(&file_path, locator, &value),
        ("toml", Some(locator)) => bump_toml(&file_path, locator, &value),
        ("json", Some(locator)) => bump_json(&file_path, locator, &value),
        _ => bump_generic(&file_path, &value),
      }
    };

    match applied {
      Ok(()) => {
        let label = match &locator {
          Some(locator) => format!("{rel_path}:{locator} -> {value}"),
          None => format!("{rel_path} -> {value}"),
        };
        outcome.updated.push(label);
      }
      Err(message) => outcome.errors.push(message),
    }
  }

  outcome
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn entry(kind: &str, path: &str, locator_field: Option<(&str, &str)>) -> ExtraFile {
    let mut extra = ExtraFile {
      kind: Some(kind.to_string()),
      path: Some(path.to_string()),
      yaml_path: None,
      toml_path: None,
      json_path: None,
      use_prefix: None,
    };
    match locator_field {
      Some(("yaml-path", l)) => extra.yaml_path = Some(l.to_string()),
      Some(("toml-path", l)) => extra.toml_path = Some(l.to_string()),
      Some(("json-path", l)) => extra.json_path = Some(l.to_string()),
      _ => {}
    }
    extra
  }

  #[test]
  fn test_yaml_nested_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chart.yaml");
    std::fs::write(&path, "name: app\nspec:\n  version: 1.0.0\n  replicas: 3\n").unwrap();

    bump_yaml(&path, "$.spec.version", "2.0.0").unwrap();

    let data: serde_yaml::Value =
      serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(data["spec"]["version"], "2.0.0");
    assert_eq!(data["spec"]["replicas"], 3);
    assert_eq!(data["name"], "app");
  }

  #[test]
  fn test_toml_preserves_comments() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Cargo.toml");
    std::fs::write(
      &path,
      "# package manifest\n[package]\nname = \"app\" # keep me\nversion = \"1.0.0\"\n",
    )
    .unwrap();

    bump_toml(&path, "$.package.version", "1.1.0").unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("# package manifest"));
    assert!(content.contains("# keep me"));
    assert!(content.contains("version = \"1.1.0\""));
  }

  #[test]
  fn test_json_bump_and_siblings_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("package.json");
    std::fs::write(&path, "{\n  \"name\": \"app\",\n  \"version\": \"1.0.0\"\n}\n").unwrap();

    bump_json(&path, "$.version", "1.0.1").unwrap();

    let data: serde_json::Value =
      serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(data["version"], "1.0.1");
    assert_eq!(data["name"], "app");
  }

  #[test]
  fn test_locator_not_found() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.yaml");
    std::fs::write(&path, "version: 1.0.0\n").unwrap();

    let err = bump_yaml(&path, "$.missing.version", "2.0.0").unwrap_err();
    assert!(err.contains("$.missing.version"));
  }

  #[test]
  fn test_locator_rejects_wildcards() {
    assert!(parse_locator("$.items[*].version").is_err());
    assert!(parse_locator("version").is_err());
    assert!(parse_locator("$.a.b").is_ok());
  }

  #[test]
  fn test_generic_replaces_every_token_in_every_block() {
    let content = "\
intro v0.9.9 untouched
contiamo-release-please-bump-start
image: repo/app:v1.0.0 and sidecar 1.0.0
contiamo-release-please-bump-end
middle 3.3.3 untouched
contiamo-release-please-bump-start
pinned = \"1.0.0\"  # also 1.0.0 here
contiamo-release-please-bump-end
";
    let (rewritten, replaced) = rewrite_marker_blocks(content, "2.0.0").unwrap();
    assert_eq!(replaced, 4);
    assert!(rewritten.contains("intro v0.9.9 untouched"));
    assert!(rewritten.contains("middle 3.3.3 untouched"));
    assert!(rewritten.contains("image: repo/app:2.0.0 and sidecar 2.0.0"));
    assert!(rewritten.contains("pinned = \"2.0.0\"  # also 2.0.0 here"));
  }

  #[test]
  fn test_generic_without_blocks_fails() {
    assert!(rewrite_marker_blocks("just text 1.0.0\n", "2.0.0").is_err());
  }

  #[test]
  fn test_generic_with_empty_block_fails() {
    let content = "contiamo-release-please-bump-start\nno tokens here\ncontiamo-release-please-bump-end\n";
    let err = rewrite_marker_blocks(content, "2.0.0").unwrap_err();
    assert!(err.contains("no version tokens"));
  }

  #[test]
  fn test_bump_all_collects_errors_and_continues() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("good.yaml"), "version: 1.0.0\n").unwrap();

    let entries = vec![
      ExtraFile {
        kind: None,
        path: Some("good.yaml".to_string()),
        yaml_path: None,
        toml_path: None,
        json_path: None,
        use_prefix: None,
      },
      entry("xml", "a.xml", None),
      entry("yaml", "missing.yaml", Some(("yaml-path", "$.version"))),
      entry("yaml", "good.yaml", Some(("yaml-path", "$.version"))),
    ];

    let outcome = bump_all(&entries, "2.0.0", dir.path(), false);
    assert_eq!(outcome.updated, vec!["good.yaml:$.version -> 2.0.0"]);
    assert_eq!(outcome.errors.len(), 3);
    assert!(outcome.errors[0].contains("'type'"));
    assert!(outcome.errors[1].contains("unsupported file type: xml"));
    assert!(outcome.errors[2].contains("file not found"));
  }

  #[test]
  fn test_bump_all_applies_use_prefix() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("v.yaml"), "version: v1.0.0\n").unwrap();

    let mut e = entry("yaml", "v.yaml", Some(("yaml-path", "$.version")));
    e.use_prefix = Some("v".to_string());

    let outcome = bump_all(&[e], "2.0.0", dir.path(), false);
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.updated, vec!["v.yaml:$.version -> v2.0.0"]);

    let data: serde_yaml::Value =
      serde_yaml::from_str(&std::fs::read_to_string(dir.path().join("v.yaml")).unwrap()).unwrap();
    assert_eq!(data["version"], "v2.0.0");
  }

  #[test]
  fn test_dry_run_reports_without_writing() {
    let dir = TempDir::new().unwrap();
    let original = "version: 1.0.0\n";
    std::fs::write(dir.path().join("v.yaml"), original).unwrap();

    let entries = vec![entry("yaml", "v.yaml", Some(("yaml-path", "$.version")))];
    let outcome = bump_all(&entries, "2.0.0", dir.path(), true);

    assert_eq!(outcome.updated, vec!["v.yaml:$.version -> 2.0.0"]);
    assert!(outcome.errors.is_empty());
    assert_eq!(std::fs::read_to_string(dir.path().join("v.yaml")).unwrap(), original);
  }
}
