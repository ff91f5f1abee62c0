//! External tool invocation
//!
//! Every collaborator that runs a process (python, twine, git, makepkg) is a
//! [`Tool`]: a single synchronous `execute(args, workdir)` capability. Pipelines
//! only ever see the trait, so they run against scripted tools in tests.

use crate::core::config::ToolsConfig;
use crate::core::error::{DeployError, DeployResult, Step};
use crate::oracle::Channel;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Captured result of one tool invocation
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
  /// Process exit code (-1 when terminated by a signal)
  pub exit_code: i32,
  pub stdout: Vec<u8>,
  pub stderr: Vec<u8>,
}

impl ToolOutput {
  pub fn success(&self) -> bool {
    self.exit_code == 0
  }

  pub fn stdout_str(&self) -> String {
    String::from_utf8_lossy(&self.stdout).into_owned()
  }

  pub fn stderr_str(&self) -> String {
    String::from_utf8_lossy(&self.stderr).into_owned()
  }

  /// Best human-readable explanation of a failure (stderr, else stdout)
  pub fn diagnostic(&self) -> String {
    let stderr = self.stderr_str();
    if stderr.trim().is_empty() {
      self.stdout_str()
    } else {
      stderr
    }
  }
}

/// A narrow, synchronous external-process capability
pub trait Tool {
  /// Short name used in logs
  fn name(&self) -> &str;

  /// Run the tool with `args` in `workdir` to completion.
  ///
  /// Returns `Err` only when the process could not be started; a non-zero
  /// exit is reported through [`ToolOutput::exit_code`].
  fn execute(&self, args: &[&str], workdir: &Path) -> DeployResult<ToolOutput>;
}

/// Tool backed by a system executable
pub struct SystemTool {
  name: String,
  program: String,
  base_args: Vec<String>,
}

impl SystemTool {
  pub fn new(program: impl Into<String>) -> Self {
    let program = program.into();
    Self {
      name: program.clone(),
      program,
      base_args: Vec::new(),
    }
  }

  /// Arguments inserted before every call (`python3 -m twine ...`)
  pub fn with_base_args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.base_args = args.into_iter().map(Into::into).collect();
    self
  }

  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }
}

impl Tool for SystemTool {
  fn name(&self) -> &str {
    &self.name
  }

  fn execute(&self, args: &[&str], workdir: &Path) -> DeployResult<ToolOutput> {
    debug!(
      tool = %self.name,
      program = %self.program,
      args = ?args,
      workdir = %workdir.display(),
      "executing"
    );

    // output() waits for exit and drains both pipes, so handles never leak
    let output = Command::new(&self.program)
      .args(&self.base_args)
      .args(args)
      .current_dir(workdir)
      .output()
      .map_err(|e| DeployError::message(format!("Failed to run {}: {}", self.program, e)))?;

    let result = ToolOutput {
      exit_code: output.status.code().unwrap_or(-1),
      stdout: output.stdout,
      stderr: output.stderr,
    };
    debug!(tool = %self.name, exit_code = result.exit_code, "finished");
    Ok(result)
  }
}

/// Run one publish step to completion
///
/// A process that cannot be started and a non-zero exit both become a step
/// failure naming `channel` and `step`.
pub fn run_step(tool: &dyn Tool, channel: Channel, step: Step, args: &[&str], workdir: &Path) -> DeployResult<ToolOutput> {
  let output = tool
    .execute(args, workdir)
    .map_err(|e| DeployError::step(channel, step, None, e.to_string()))?;
  if !output.success() {
    return Err(DeployError::step(channel, step, Some(output.exit_code), output.diagnostic()));
  }
  Ok(output)
}

/// The external tools a deployment needs
pub struct Toolchain {
  /// Project descriptor queries and the sdist/wheel build
  pub python: Box<dyn Tool>,
  /// Distribution check and upload
  pub twine: Box<dyn Tool>,
  /// Recipe workspace version control
  pub git: Box<dyn Tool>,
  /// Recipe metadata summary (.SRCINFO)
  pub makepkg: Box<dyn Tool>,
}

impl Toolchain {
  /// System executables named by the `[tools]` config section
  pub fn system(tools: &ToolsConfig) -> Self {
    Self {
      python: Box::new(SystemTool::new(tools.python.clone())),
      twine: Box::new(
        SystemTool::new(tools.python.clone())
          .with_base_args(["-m", "twine"])
          .named("twine"),
      ),
      git: Box::new(SystemTool::new(tools.git.clone())),
      makepkg: Box::new(SystemTool::new(tools.makepkg.clone())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_diagnostic_prefers_stderr() {
    let out = ToolOutput {
      exit_code: 1,
      stdout: b"progress".to_vec(),
      stderr: b"boom".to_vec(),
    };
    assert_eq!(out.diagnostic(), "boom");

    let out = ToolOutput {
      exit_code: 1,
      stdout: b"only stdout".to_vec(),
      stderr: b"  \n".to_vec(),
    };
    assert_eq!(out.diagnostic(), "only stdout");
  }

  #[test]
  fn test_missing_program_is_spawn_error() {
    let tool = SystemTool::new("definitely-not-a-real-program-aur-deploy");
    let dir = tempfile::tempdir().unwrap();
    assert!(tool.execute(&["--version"], dir.path()).is_err());
  }

  #[test]
  fn test_run_step_maps_spawn_failure_and_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let tool = SystemTool::new("definitely-not-a-real-program-aur-deploy");
    let err = run_step(&tool, Channel::Repository, Step::Summary, &["--printsrcinfo"], dir.path()).unwrap_err();
    match err {
      DeployError::Step(e) => {
        assert_eq!(e.step, Step::Summary);
        assert_eq!(e.exit_code, None);
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[cfg(unix)]
  #[test]
  fn test_run_step_reports_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let tool = SystemTool::new("sh").with_base_args(["-c"]);
    let err = run_step(&tool, Channel::Index, Step::Build, &["echo broken >&2; exit 4"], dir.path()).unwrap_err();
    assert_eq!(err.to_string(), "[index] build step failed (exit code 4): broken");
  }

  #[cfg(unix)]
  #[test]
  fn test_system_tool_captures_exit_code_and_output() {
    let tool = SystemTool::new("sh").with_base_args(["-c"]);
    let dir = tempfile::tempdir().unwrap();
    let out = tool.execute(&["echo hello; echo oops >&2; exit 3"], dir.path()).unwrap();
    assert_eq!(out.exit_code, 3);
    assert_eq!(out.stdout_str().trim(), "hello");
    assert_eq!(out.stderr_str().trim(), "oops");
    assert!(!out.success());
  }
}
