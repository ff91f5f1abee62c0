//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A throwaway Python project directory
pub struct TestProject {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestProject {
  /// Empty directory, no descriptor
  pub fn empty() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    Ok(Self { _root: root, path })
  }

  /// Directory with a minimal setup.py
  pub fn new(name: &str, version: &str) -> Result<Self> {
    let project = Self::empty()?;
    project.write(
      "setup.py",
      &format!(
        r#"from setuptools import setup

setup(
    name="{}",
    version="{}",
    description="Integration test project",
)
"#,
        name, version
      ),
    )?;
    Ok(project)
  }

  /// Write a file relative to the project root
  pub fn write(&self, path: &str, content: &str) -> Result<()> {
    let file = self.path.join(path);
    if let Some(parent) = file.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file, content)?;
    Ok(())
  }

  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }
}

/// Run the aur-deploy binary; the caller inspects the exit status
pub fn run_aur_deploy(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_aur-deploy");

  Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("AUR_DEPLOY_LOG")
    .output()
    .context("Failed to run aur-deploy")
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}
