//! Error types for aur-deploy with contextual messages and exit codes
//!
//! Every failure carries enough context (channel, step, exit code) for manual
//! remediation, plus an optional help line printed under the error.

use crate::oracle::Channel;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for aur-deploy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, missing descriptor, missing directory)
  User = 1,
  /// System error (network, external tools, I/O)
  System = 2,
  /// Validation failure (invalid configuration values)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for aur-deploy
#[derive(Debug)]
pub enum DeployError {
  /// Configuration errors
  Config(ConfigError),

  /// Project descriptor could not be queried
  Descriptor(DescriptorError),

  /// Remote listing lookup failed (distinct from "not found")
  Lookup(LookupError),

  /// An external publish step exited unsuccessfully
  Step(StepError),

  /// Recipe rewrite could not be completed atomically
  Patch(PatchError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl DeployError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    DeployError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    DeployError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Shorthand for a failed external step
  pub fn step(channel: Channel, step: Step, exit_code: Option<i32>, detail: impl Into<String>) -> Self {
    DeployError::Step(StepError {
      channel,
      step,
      exit_code,
      detail: detail.into(),
    })
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      DeployError::Message { message, context, help } => DeployError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      DeployError::Io(err) => DeployError::Message {
        message: format!("I/O error: {}", err),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      DeployError::Config(ConfigError::Invalid { .. }) => ExitCode::Validation,
      DeployError::Config(_) => ExitCode::User,
      DeployError::Descriptor(_) => ExitCode::User,
      DeployError::Lookup(_) => ExitCode::System,
      DeployError::Step(_) => ExitCode::System,
      DeployError::Patch(_) => ExitCode::System,
      DeployError::Io(_) => ExitCode::System,
      DeployError::Message { .. } => ExitCode::User,
    }
  }

  /// Taxonomy name of this failure, used in logs and the JSON report
  pub fn kind(&self) -> &'static str {
    match self {
      DeployError::Config(_) => "ConfigError",
      DeployError::Descriptor(_) => "MissingDescriptor",
      DeployError::Lookup(_) => "RemoteLookupFailure",
      DeployError::Step(e) => e.step.failure_kind(),
      DeployError::Patch(_) => "PatchFailure",
      DeployError::Io(_) => "IoError",
      DeployError::Message { .. } => "Error",
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      DeployError::Config(e) => e.help_message(),
      DeployError::Descriptor(e) => e.help_message(),
      DeployError::Lookup(e) => e.help_message(),
      DeployError::Step(e) => e.help_message(),
      DeployError::Patch(e) => e.help_message(),
      DeployError::Message { help, .. } => help.clone(),
      DeployError::Io(_) => None,
    }
  }
}

impl fmt::Display for DeployError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DeployError::Config(e) => write!(f, "{}", e),
      DeployError::Descriptor(e) => write!(f, "{}", e),
      DeployError::Lookup(e) => write!(f, "{}", e),
      DeployError::Step(e) => write!(f, "{}", e),
      DeployError::Patch(e) => write!(f, "{}", e),
      DeployError::Io(e) => write!(f, "I/O error: {}", e),
      DeployError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for DeployError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      DeployError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for DeployError {
  fn from(err: io::Error) -> Self {
    DeployError::Io(err)
  }
}

impl From<String> for DeployError {
  fn from(msg: String) -> Self {
    DeployError::message(msg)
  }
}

impl From<&str> for DeployError {
  fn from(msg: &str) -> Self {
    DeployError::message(msg)
  }
}

impl From<toml_edit::de::Error> for DeployError {
  fn from(err: toml_edit::de::Error) -> Self {
    DeployError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for DeployError {
  fn from(err: serde_json::Error) -> Self {
    DeployError::message(format!("JSON error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for DeployError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    DeployError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Config file exists but could not be read or parsed
  Unreadable { path: PathBuf, reason: String },

  /// A config value failed validation
  Invalid { field: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::Unreadable { .. } => {
        Some("Fix the TOML syntax or delete the file to fall back to built-in defaults.".to_string())
      }
      ConfigError::Invalid { field, .. } => Some(format!("Check the `{}` entry in deploy.toml.", field)),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Unreadable { path, reason } => {
        write!(f, "Failed to load config from {}: {}", path.display(), reason)
      }
      ConfigError::Invalid { field, reason } => {
        write!(f, "Invalid config value for {}: {}", field, reason)
      }
    }
  }
}

/// Project descriptor errors (MissingDescriptor)
#[derive(Debug)]
pub enum DescriptorError {
  /// Target directory does not exist
  NoProjectDirectory { path: PathBuf },

  /// No build descriptor in the project directory
  NotFound { path: PathBuf },

  /// Descriptor query exited non-zero or produced unparseable output
  Unreadable { path: PathBuf, reason: String },
}

impl DescriptorError {
  fn help_message(&self) -> Option<String> {
    match self {
      DescriptorError::NoProjectDirectory { .. } => Some("Pass an existing directory with --directory.".to_string()),
      DescriptorError::NotFound { .. } => Some("Please prepare setup.py for deployment.".to_string()),
      DescriptorError::Unreadable { .. } => {
        Some("Make sure `setup.py --name --version --description` runs cleanly.".to_string())
      }
    }
  }
}

impl fmt::Display for DescriptorError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DescriptorError::NoProjectDirectory { path } => {
        write!(f, "Cannot run in directory, no such directory: {}", path.display())
      }
      DescriptorError::NotFound { path } => {
        write!(f, "No project descriptor found: {}", path.display())
      }
      DescriptorError::Unreadable { path, reason } => {
        write!(f, "Failed to read project descriptor {}: {}", path.display(), reason)
      }
    }
  }
}

/// Remote lookup errors (RemoteLookupFailure)
#[derive(Debug)]
pub struct LookupError {
  pub channel: Channel,
  pub url: String,
  pub reason: String,
}

impl LookupError {
  fn help_message(&self) -> Option<String> {
    Some(format!(
      "Check network access to {} or rerun with --force to skip the version check.",
      self.url
    ))
  }
}

impl fmt::Display for LookupError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{}] remote lookup of {} failed: {}", self.channel, self.url, self.reason)
  }
}

/// Publish step identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
  Credentials,
  Clean,
  Build,
  Verify,
  Upload,
  Checksum,
  Dependencies,
  Init,
  Clone,
  Generate,
  Summary,
  Branch,
  Stage,
  Commit,
  Push,
}

impl Step {
  /// Taxonomy name reported for a failure at this step
  pub fn failure_kind(self) -> &'static str {
    match self {
      Step::Clean | Step::Build | Step::Checksum => "BuildStepFailure",
      Step::Verify => "VerifyStepFailure",
      Step::Credentials | Step::Upload => "UploadStepFailure",
      Step::Push => "PushFailure",
      Step::Dependencies | Step::Generate => "RecipeStepFailure",
      Step::Summary => "SummaryStepFailure",
      Step::Init | Step::Clone | Step::Branch | Step::Stage | Step::Commit => "VcsStepFailure",
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Step::Credentials => "credentials",
      Step::Clean => "clean",
      Step::Build => "build",
      Step::Verify => "verify",
      Step::Upload => "upload",
      Step::Checksum => "checksum",
      Step::Dependencies => "dependencies",
      Step::Init => "init",
      Step::Clone => "clone",
      Step::Generate => "generate",
      Step::Summary => "summary",
      Step::Branch => "branch",
      Step::Stage => "stage",
      Step::Commit => "commit",
      Step::Push => "push",
    }
  }
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A failed external step
#[derive(Debug)]
pub struct StepError {
  pub channel: Channel,
  pub step: Step,
  /// `None` when the step failed before a process exited (spawn failure, missing input)
  pub exit_code: Option<i32>,
  pub detail: String,
}

impl StepError {
  fn help_message(&self) -> Option<String> {
    match self.step {
      Step::Credentials | Step::Upload => Some(
        "Export TWINE_PASSWORD (with TWINE_USERNAME=__token__) or configure ~/.pypirc for twine.".to_string(),
      ),
      Step::Push => {
        if self.detail.contains("Permission denied") || self.detail.contains("publickey") {
          Some("Check that your SSH key is registered with the AUR account.".to_string())
        } else {
          Some("Fix the problem in the recipe workspace and push manually, or rerun with --force.".to_string())
        }
      }
      Step::Summary => Some("Run `makepkg --printsrcinfo` in the recipe workspace to see the error.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for StepError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{}] {} step failed", self.channel, self.step)?;
    if let Some(code) = self.exit_code {
      write!(f, " (exit code {})", code)?;
    }
    let detail = self.detail.trim();
    if !detail.is_empty() {
      write!(f, ": {}", detail)?;
    }
    Ok(())
  }
}

/// Recipe rewrite errors (PatchFailure)
#[derive(Debug)]
pub struct PatchError {
  pub path: PathBuf,
  pub reason: String,
}

impl PatchError {
  fn help_message(&self) -> Option<String> {
    Some(format!("{} was left untouched; fix it by hand and rerun.", self.path.display()))
  }
}

impl fmt::Display for PatchError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Failed to patch {}: {}", self.path.display(), self.reason)
  }
}

/// Result type alias for aur-deploy
pub type DeployResult<T> = Result<T, DeployError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> DeployResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> DeployResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<DeployError>,
{
  fn context(self, ctx: impl Into<String>) -> DeployResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> DeployResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &DeployError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
