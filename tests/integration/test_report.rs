//! `--json` runs: stdout carries only the report

use crate::helpers::*;
use anyhow::Result;

/// Project whose descriptor query is answered by a shell script and whose
/// listings point at a closed local port
#[cfg(unix)]
fn offline_project() -> Result<TestProject> {
  use std::os::unix::fs::PermissionsExt;

  let project = TestProject::new("demo", "1.0.0")?;
  project.write("fake-python", "#!/bin/sh\nprintf 'demo\\n1.0.0\\nDemo project\\n'\n")?;
  let script = project.path.join("fake-python");
  std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;
  project.write(
    "deploy.toml",
    &format!(
      "[tools]\npython = \"{}\"\n\n[index]\nlisting_url = \"http://127.0.0.1:9/{{name}}/\"\n\n[repository]\nlisting_url = \"http://127.0.0.1:9/{{package}}/\"\n",
      script.display()
    ),
  )?;
  Ok(project)
}

#[cfg(unix)]
#[test]
fn test_json_report_keeps_progress_off_stdout() -> Result<()> {
  let project = offline_project()?;
  let output = run_aur_deploy(&project.path, &["--json", "--no-aur"])?;

  let report: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(report["project"], "demo");
  assert_eq!(report["channels"][0]["outcome"], "failed");
  assert_eq!(report["exit_code"].as_i64(), output.status.code().map(i64::from));
  assert!(!output.status.success());

  let err = stderr(&output);
  assert!(err.contains("🔍 Checking"), "progress missing from stderr:\n{}", err);
  Ok(())
}

#[cfg(unix)]
#[test]
fn test_progress_on_stdout_without_json() -> Result<()> {
  let project = offline_project()?;
  let output = run_aur_deploy(&project.path, &["--no-aur"])?;

  let out = stdout(&output);
  assert!(out.contains("🔍 Checking"));
  assert!(out.contains("📊 Deployment summary for demo 1.0.0"));
  Ok(())
}
