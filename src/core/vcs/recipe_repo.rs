//! Git operations on the recipe workspace

use crate::core::error::{DeployError, DeployResult, ResultExt, Step};
use crate::core::exec::{Tool, ToolOutput, run_step};
use crate::core::progress::progress;
use crate::oracle::Channel;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A git working tree holding the recipe, driven through the git tool
pub struct RecipeRepo<'a> {
  git: &'a dyn Tool,
  workdir: PathBuf,
}

impl<'a> RecipeRepo<'a> {
  /// Wrap an existing workspace directory
  pub fn open(git: &'a dyn Tool, workdir: impl Into<PathBuf>) -> Self {
    Self {
      git,
      workdir: workdir.into(),
    }
  }

  /// Create `workdir` and `git init` it
  pub fn init(git: &'a dyn Tool, workdir: impl Into<PathBuf>) -> DeployResult<Self> {
    let repo = Self::open(git, workdir);
    fs::create_dir_all(&repo.workdir)
      .with_context(|| format!("Failed to create recipe workspace {}", repo.workdir.display()))?;
    repo.run(Step::Init, &["init"])?;
    Ok(repo)
  }

  /// `git clone <remote_url> <workdir>`, run from the workdir's parent
  pub fn clone_into(git: &'a dyn Tool, remote_url: &str, workdir: impl Into<PathBuf>) -> DeployResult<Self> {
    let workdir = workdir.into();
    let parent = workdir
      .parent()
      .ok_or_else(|| {
        DeployError::with_help(
          format!("Workspace {} has no parent directory", workdir.display()),
          "Set `[repository] workspace` to a directory inside the project.",
        )
      })?;
    fs::create_dir_all(parent)?;

    let target = workdir.to_string_lossy().into_owned();
    run_step(git, Channel::Repository, Step::Clone, &["clone", remote_url, &target], parent)?;
    Ok(Self::open(git, workdir))
  }

  pub fn workdir(&self) -> &Path {
    &self.workdir
  }

  fn run(&self, step: Step, args: &[&str]) -> DeployResult<ToolOutput> {
    run_step(self.git, Channel::Repository, step, args, &self.workdir)
  }

  /// Register `url` as remote `name`; an existing remote of that name is kept
  pub fn add_remote(&self, name: &str, url: &str) -> DeployResult<()> {
    let output = self.git.execute(&["remote", "add", name, url], &self.workdir)?;
    if output.success() {
      return Ok(());
    }
    if output.diagnostic().contains("already exists") {
      debug!(remote = name, "remote already configured");
      return Ok(());
    }
    Err(step_failure(Step::Init, &output))
  }

  /// Name of the checked-out branch (also works before the first commit)
  pub fn current_branch(&self) -> DeployResult<String> {
    let output = self.run(Step::Branch, &["branch", "--show-current"])?;
    Ok(output.stdout_str().trim().to_string())
  }

  pub fn rename_branch(&self, name: &str) -> DeployResult<()> {
    self.run(Step::Branch, &["branch", "-m", name])?;
    Ok(())
  }

  /// Rename the current branch to `required` if needed; returns the branch name
  pub fn ensure_branch(&self, required: &str) -> DeployResult<String> {
    let current = self.current_branch()?;
    if current != required {
      progress!("   Renaming branch '{}' to '{}'", current, required);
      self.rename_branch(required)?;
    }
    Ok(required.to_string())
  }

  pub fn stage(&self, paths: &[&str]) -> DeployResult<()> {
    let mut args = vec!["add", "--"];
    args.extend_from_slice(paths);
    self.run(Step::Stage, &args)?;
    Ok(())
  }

  /// Commit staged changes; `Ok(false)` when there was nothing to commit
  pub fn commit(&self, message: &str) -> DeployResult<bool> {
    let output = self.git.execute(&["commit", "-m", message], &self.workdir)?;
    if output.success() {
      return Ok(true);
    }

    let text = format!("{}{}", output.stdout_str(), output.stderr_str());
    if text.contains("nothing to commit") || text.contains("nothing added to commit") {
      warn!(workdir = %self.workdir.display(), "nothing to commit");
      return Ok(false);
    }
    Err(step_failure(Step::Commit, &output))
  }

  /// First configured remote
  pub fn primary_remote(&self) -> DeployResult<String> {
    let output = self.run(Step::Push, &["remote"])?;
    output
      .stdout_str()
      .lines()
      .map(str::trim)
      .find(|name| !name.is_empty())
      .map(str::to_string)
      .ok_or_else(|| DeployError::step(Channel::Repository, Step::Push, None, "workspace has no git remote"))
  }

  pub fn push_upstream(&self, remote: &str, branch: &str) -> DeployResult<()> {
    self.run(Step::Push, &["push", "--set-upstream", remote, branch])?;
    Ok(())
  }

  /// Whether `dir` is inside a git working tree
  pub fn is_repository(git: &dyn Tool, dir: &Path) -> bool {
    match git.execute(&["rev-parse", "--is-inside-work-tree"], dir) {
      Ok(output) => output.success() && output.stdout_str().trim() == "true",
      Err(_) => false,
    }
  }

  /// Register `path` (relative to `project_dir`) as a submodule tracking `remote_url`
  pub fn add_submodule(git: &dyn Tool, project_dir: &Path, remote_url: &str, path: &Path) -> DeployResult<()> {
    let path = path.to_string_lossy();
    let output = git.execute(&["submodule", "add", remote_url, &path], project_dir)?;
    if !output.success() {
      return Err(step_failure(Step::Init, &output));
    }
    Ok(())
  }
}

fn step_failure(step: Step, output: &ToolOutput) -> DeployError {
  DeployError::step(Channel::Repository, step, Some(output.exit_code), output.diagnostic())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::ScriptedTool;

  #[test]
  fn test_init_creates_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let git = ScriptedTool::new("git");
    let workdir = dir.path().join("aur");

    let repo = RecipeRepo::init(&git, &workdir).unwrap();
    assert!(workdir.is_dir());
    assert_eq!(repo.workdir(), workdir);
    assert_eq!(git.calls()[0].args, vec!["init"]);
    assert_eq!(git.calls()[0].workdir, workdir);
  }

  #[test]
  fn test_clone_runs_in_parent() {
    let dir = tempfile::tempdir().unwrap();
    let git = ScriptedTool::new("git");
    let workdir = dir.path().join("aur");

    RecipeRepo::clone_into(&git, "ssh://aur@example/python-demo.git", &workdir).unwrap();
    let call = &git.calls()[0];
    assert_eq!(call.workdir, dir.path());
    assert_eq!(call.args[..2], ["clone", "ssh://aur@example/python-demo.git"]);
  }

  #[test]
  fn test_clone_failure_is_vcs_step_failure() {
    let dir = tempfile::tempdir().unwrap();
    let git = ScriptedTool::new("git");
    git.respond_err("clone", 128, "fatal: repository not found");

    let result = RecipeRepo::clone_into(&git, "ssh://x", dir.path().join("aur"));
    let err = result.err().unwrap();
    assert_eq!(err.kind(), "VcsStepFailure");
    assert!(err.to_string().contains("exit code 128"));
  }

  #[test]
  fn test_add_remote_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let git = ScriptedTool::new("git");
    git.respond_err("remote add", 3, "error: remote aur already exists.");

    let repo = RecipeRepo::open(&git, dir.path());
    assert!(repo.add_remote("aur", "ssh://x").is_ok());
  }

  #[test]
  fn test_ensure_branch_renames_only_when_needed() {
    let dir = tempfile::tempdir().unwrap();
    let git = ScriptedTool::new("git");
    git.respond("branch --show-current", 0, "main\n");
    let repo = RecipeRepo::open(&git, dir.path());

    assert_eq!(repo.ensure_branch("master").unwrap(), "master");
    assert!(git.was_called("branch -m master"));

    let git = ScriptedTool::new("git");
    git.respond("branch --show-current", 0, "master\n");
    let repo = RecipeRepo::open(&git, dir.path());
    repo.ensure_branch("master").unwrap();
    assert!(!git.was_called("branch -m"));
  }

  #[test]
  fn test_commit_with_nothing_to_commit_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let git = ScriptedTool::new("git");
    git.respond("commit", 1, "On branch master\nnothing to commit, working tree clean\n");

    let repo = RecipeRepo::open(&git, dir.path());
    assert!(!repo.commit("Updated to v1.0").unwrap());
  }

  #[test]
  fn test_commit_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let git = ScriptedTool::new("git");
    git.respond_err("commit", 128, "Please tell me who you are.");

    let repo = RecipeRepo::open(&git, dir.path());
    let err = repo.commit("Updated to v1.0").unwrap_err();
    match err {
      DeployError::Step(e) => assert_eq!(e.step, Step::Commit),
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn test_primary_remote_and_push() {
    let dir = tempfile::tempdir().unwrap();
    let git = ScriptedTool::new("git");
    git.respond("remote", 0, "aur\norigin\n");
    let repo = RecipeRepo::open(&git, dir.path());

    let remote = repo.primary_remote().unwrap();
    assert_eq!(remote, "aur");
    repo.push_upstream(&remote, "master").unwrap();
    assert!(git.was_called("push --set-upstream aur master"));
  }

  #[test]
  fn test_push_rejection_is_push_failure() {
    let dir = tempfile::tempdir().unwrap();
    let git = ScriptedTool::new("git");
    git.respond_err("push", 1, "! [rejected] master -> master (fetch first)");
    let repo = RecipeRepo::open(&git, dir.path());

    let err = repo.push_upstream("aur", "master").unwrap_err();
    assert_eq!(err.kind(), "PushFailure");
  }

  #[test]
  fn test_missing_remote_is_push_failure() {
    let dir = tempfile::tempdir().unwrap();
    let git = ScriptedTool::new("git");
    let repo = RecipeRepo::open(&git, dir.path());
    assert_eq!(repo.primary_remote().unwrap_err().kind(), "PushFailure");
  }

  #[test]
  fn test_is_repository() {
    let dir = tempfile::tempdir().unwrap();
    let git = ScriptedTool::new("git");
    git.respond_err("rev-parse", 128, "fatal: not a git repository");
    assert!(!RecipeRepo::is_repository(&git, dir.path()));

    git.respond("rev-parse", 0, "true\n");
    assert!(RecipeRepo::is_repository(&git, dir.path()));
  }
}
