//! Repository dependency set for newly generated recipes

use crate::core::config::{PolicyConfig, RepositoryConfig};
use crate::core::error::{DeployError, DeployResult, Step};
use crate::core::exec::Tool;
use crate::oracle::Channel;
use crate::project::metadata::DESCRIPTOR_FILE;
use std::collections::BTreeSet;
use std::path::Path;

/// Declared requirements of the project, as listed by `setup.py --requires`
pub fn declared_requirements(python: &dyn Tool, project_dir: &Path) -> DeployResult<Vec<String>> {
  let output = python.execute(&[DESCRIPTOR_FILE, "--requires"], project_dir)?;
  if !output.success() {
    return Err(DeployError::step(
      Channel::Repository,
      Step::Dependencies,
      Some(output.exit_code),
      output.diagnostic(),
    ));
  }

  Ok(
    output
      .stdout_str()
      .lines()
      .filter_map(requirement_name)
      .collect(),
  )
}

/// Distribution name of a requirement line (`requests>=2.0; python_version>"3"` → `requests`)
pub fn requirement_name(line: &str) -> Option<String> {
  let line = line.trim();
  if line.is_empty() || line.starts_with('#') {
    return None;
  }

  let end = line
    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'))
    .unwrap_or(line.len());
  let name = &line[..end];
  if name.is_empty() {
    None
  } else {
    Some(name.to_lowercase())
  }
}

/// Build the dependency set for a first-time recipe
///
/// Declared requirements are prefixed (`python-requests`), extra names are taken
/// as-is, and the interpreter's own package is dropped when the policy says so.
pub fn dependency_set(
  declared: &[String],
  extra: &BTreeSet<String>,
  repository: &RepositoryConfig,
  policy: &PolicyConfig,
) -> BTreeSet<String> {
  let mut deps: BTreeSet<String> = declared
    .iter()
    .map(|name| format!("{}-{}", repository.package_prefix, name))
    .collect();

  deps.extend(extra.iter().map(|d| d.trim().to_string()).filter(|d| !d.is_empty()));

  if policy.filter_interpreter_dependency {
    deps.remove(&policy.interpreter_package);
  }

  deps
}
