//! Project metadata read from the build descriptor (setup.py)

use crate::core::error::{DescriptorError, DeployError, DeployResult};
use crate::core::exec::Tool;
use crate::core::version::SemanticVersion;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Build descriptor filename
pub const DESCRIPTOR_FILE: &str = "setup.py";

/// Name, version and description of the project being deployed
///
/// Read once per run; immutable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectMetadata {
  pub name: String,
  pub version: SemanticVersion,
  pub description: String,
}

impl ProjectMetadata {
  /// Query the descriptor in `project_dir` through the python tool
  pub fn load(python: &dyn Tool, project_dir: &Path) -> DeployResult<Self> {
    let descriptor = descriptor_path(project_dir);
    if !descriptor.is_file() {
      return Err(DeployError::Descriptor(DescriptorError::NotFound { path: descriptor }));
    }

    let unreadable = |reason: String| {
      DeployError::Descriptor(DescriptorError::Unreadable {
        path: descriptor.clone(),
        reason,
      })
    };

    let output = python
      .execute(
        &[DESCRIPTOR_FILE, "--name", "--version", "--description"],
        project_dir,
      )
      .map_err(|e| unreadable(e.to_string()))?;

    if !output.success() {
      return Err(unreadable(format!(
        "exit code {}: {}",
        output.exit_code,
        output.diagnostic().trim()
      )));
    }

    Self::parse(&output.stdout_str()).map_err(unreadable)
  }

  /// Parse the three-line `--name --version --description` output
  pub fn parse(stdout: &str) -> Result<Self, String> {
    let mut lines = stdout.lines().map(str::trim);

    let name = lines.next().filter(|s| !s.is_empty()).ok_or("missing project name")?;
    let raw_version = lines.next().filter(|s| !s.is_empty()).ok_or("missing project version")?;
    let description = lines.next().unwrap_or("").to_string();

    let version = SemanticVersion::parse(raw_version);
    if version.is_absent() {
      return Err(format!("unparseable project version '{}'", raw_version));
    }

    Ok(Self {
      name: name.to_string(),
      version,
      description,
    })
  }
}

/// Location of the descriptor inside a project directory
pub fn descriptor_path(project_dir: &Path) -> PathBuf {
  project_dir.join(DESCRIPTOR_FILE)
}
