//! Command-line failures that stop a run before any channel starts

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_help_lists_flags() -> Result<()> {
  let project = TestProject::empty()?;
  let output = run_aur_deploy(&project.path, &["--help"])?;

  assert!(output.status.success());
  let help = stdout(&output);
  for flag in ["--force", "--directory", "--no-aur", "--aur-depends", "--yes", "--json"] {
    assert!(help.contains(flag), "missing {} in:\n{}", flag, help);
  }
  Ok(())
}

#[test]
fn test_missing_directory_is_user_error() -> Result<()> {
  let project = TestProject::empty()?;
  let output = run_aur_deploy(&project.path, &["--directory", "does/not/exist"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("no such directory"));
  Ok(())
}

#[test]
fn test_missing_descriptor_is_user_error() -> Result<()> {
  let project = TestProject::empty()?;
  let output = run_aur_deploy(&project.path, &[])?;

  assert_eq!(output.status.code(), Some(1));
  let err = stderr(&output);
  assert!(err.contains("No project descriptor found"));
  assert!(err.contains("Please prepare setup.py for deployment."));
  Ok(())
}

#[test]
fn test_directory_given_as_file_uses_parent() -> Result<()> {
  let project = TestProject::empty()?;
  project.write("pkg/README.md", "# demo\n")?;
  let output = run_aur_deploy(&project.path, &["-d", "pkg/README.md"])?;

  // resolved to pkg/, which has no setup.py
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("setup.py"));
  Ok(())
}

#[test]
fn test_invalid_config_value_is_validation_error() -> Result<()> {
  let project = TestProject::new("demo", "1.0.0")?;
  project.write("deploy.toml", "[index]\nlisting_url = \"https://pypi.org/project/\"\n")?;
  let output = run_aur_deploy(&project.path, &[])?;

  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("index.listing_url"));
  Ok(())
}

#[test]
fn test_malformed_config_is_user_error() -> Result<()> {
  let project = TestProject::new("demo", "1.0.0")?;
  project.write(".config/deploy.toml", "[repository\n")?;
  let output = run_aur_deploy(&project.path, &[])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("Failed to load config"));
  Ok(())
}

#[test]
fn test_failing_descriptor_query_is_user_error() -> Result<()> {
  let project = TestProject::new("demo", "1.0.0")?;
  project.write("deploy.toml", "[tools]\npython = \"false\"\n")?;
  let output = run_aur_deploy(&project.path, &["--yes"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("Failed to read project descriptor"));
  assert!(!project.file_exists("dist"));
  Ok(())
}
