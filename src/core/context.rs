//! Per-run project context - resolved once in main, passed by reference
//!
//! Every operation works on the explicit project directory stored here; nothing
//! depends on the process working directory after startup.

use crate::core::config::DeployConfig;
use crate::core::error::{DeployResult, DescriptorError, DeployError};
use crate::core::exec::Tool;
use crate::project::ProjectMetadata;
use std::path::{Path, PathBuf};

/// Distribution output directory inside the project
pub const DIST_DIR: &str = "dist";

/// Intermediate build directory inside the project
pub const BUILD_DIR: &str = "build";

/// Everything a run knows about the project being deployed
#[derive(Debug, Clone)]
pub struct ProjectContext {
  /// Project directory
  pub root: PathBuf,

  /// Deployment configuration (deploy.toml or defaults)
  pub config: DeployConfig,

  /// Name, version and description from the build descriptor
  pub metadata: ProjectMetadata,
}

impl ProjectContext {
  /// Resolve the directory to deploy from
  ///
  /// `None` means the current directory; a file means its parent directory.
  pub fn resolve_directory(requested: Option<&Path>) -> DeployResult<PathBuf> {
    let directory = match requested {
      Some(path) if path.is_file() => match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
      },
      Some(path) => path.to_path_buf(),
      None => std::env::current_dir()?,
    };

    if !directory.is_dir() {
      return Err(DeployError::Descriptor(DescriptorError::NoProjectDirectory { path: directory }));
    }
    Ok(directory)
  }

  /// Read project metadata through `python` and bundle it with `config`
  pub fn build(root: &Path, config: DeployConfig, python: &dyn Tool) -> DeployResult<Self> {
    let metadata = ProjectMetadata::load(python, root)?;
    Ok(Self {
      root: root.to_path_buf(),
      config,
      metadata,
    })
  }

  /// Repository package name (`python-<name>`)
  pub fn package_name(&self) -> String {
    self.config.repository.package_name(&self.metadata.name)
  }

  /// Recipe workspace directory
  pub fn workspace_dir(&self) -> PathBuf {
    self.root.join(&self.config.repository.workspace)
  }

  pub fn dist_dir(&self) -> PathBuf {
    self.root.join(DIST_DIR)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::ScriptedTool;

  #[test]
  fn test_resolve_file_uses_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("setup.py");
    std::fs::write(&file, "").unwrap();
    assert_eq!(ProjectContext::resolve_directory(Some(&file)).unwrap(), dir.path());
  }

  #[test]
  fn test_resolve_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let err = ProjectContext::resolve_directory(Some(&missing)).unwrap_err();
    assert!(matches!(
      err,
      DeployError::Descriptor(DescriptorError::NoProjectDirectory { .. })
    ));
  }

  #[test]
  fn test_build_reads_metadata_and_paths() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("setup.py"), "").unwrap();
    let python = ScriptedTool::new("python3");
    python.respond("setup.py --name", 0, "demo\n1.0.0\nDemo project\n");

    let ctx = ProjectContext::build(dir.path(), DeployConfig::default(), &python).unwrap();
    assert_eq!(ctx.package_name(), "python-demo");
    assert_eq!(ctx.workspace_dir(), dir.path().join("aur"));
    assert_eq!(ctx.dist_dir(), dir.path().join("dist"));
  }
}
