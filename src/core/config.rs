use crate::core::error::{ConfigError, DeployError, DeployResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for aur-deploy
/// Searched in order: deploy.toml, .deploy.toml, .config/deploy.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployConfig {
  #[serde(default)]
  pub index: IndexConfig,
  #[serde(default)]
  pub repository: RepositoryConfig,
  #[serde(default)]
  pub policy: PolicyConfig,
  #[serde(default)]
  pub tools: ToolsConfig,
}

/// Language package index (PyPI)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
  /// Listing page URL, `{name}` is the project name
  #[serde(default = "default_index_listing_url")]
  pub listing_url: String,
}

fn default_index_listing_url() -> String {
  "https://pypi.org/project/{name}/".to_string()
}

impl Default for IndexConfig {
  fn default() -> Self {
    Self {
      listing_url: default_index_listing_url(),
    }
  }
}

/// Distribution community repository (AUR)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
  /// Listing page URL, `{package}` is the prefixed package name
  #[serde(default = "default_repository_listing_url")]
  pub listing_url: String,

  /// Package names are `<prefix>-<name>` (default: "python")
  #[serde(default = "default_package_prefix")]
  pub package_prefix: String,

  /// Git remote hosting the recipe, `{package}` is the prefixed package name
  #[serde(default = "default_remote_url")]
  pub remote_url: String,

  /// Recipe workspace directory, relative to the project (default: "aur")
  #[serde(default = "default_workspace")]
  pub workspace: PathBuf,

  /// Branch the remote accepts pushes on (default: "master")
  #[serde(default = "default_branch")]
  pub branch: String,

  /// Rewrite `source=(...)` with this URL on every update (`{name}`, `{version}`)
  #[serde(default)]
  pub source_url_template: Option<String>,

  /// Maintainer line for newly generated recipes
  #[serde(default)]
  pub maintainer: Option<String>,

  /// Custom template for newly generated recipes
  #[serde(default)]
  pub template: Option<PathBuf>,
}

fn default_repository_listing_url() -> String {
  "https://aur.archlinux.org/packages/{package}/".to_string()
}

fn default_package_prefix() -> String {
  "python".to_string()
}

fn default_remote_url() -> String {
  "ssh://aur@aur.archlinux.org/{package}.git".to_string()
}

fn default_workspace() -> PathBuf {
  PathBuf::from("aur")
}

fn default_branch() -> String {
  "master".to_string()
}

impl Default for RepositoryConfig {
  fn default() -> Self {
    Self {
      listing_url: default_repository_listing_url(),
      package_prefix: default_package_prefix(),
      remote_url: default_remote_url(),
      workspace: default_workspace(),
      branch: default_branch(),
      source_url_template: None,
      maintainer: None,
      template: None,
    }
  }
}

impl RepositoryConfig {
  /// `<prefix>-<name>`
  pub fn package_name(&self, project_name: &str) -> String {
    format!("{}-{}", self.package_prefix, project_name)
  }

  pub fn remote_url_for(&self, project_name: &str) -> String {
    self.remote_url.replace("{package}", &self.package_name(project_name))
  }
}

/// When a version bump resets `pkgrel`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PkgrelPolicy {
  /// Every new upstream version starts at release 1
  #[default]
  AlwaysReset,
  /// Only freshly generated recipes get release 1; updates keep the existing value
  FirstCreationOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
  #[serde(default)]
  pub pkgrel: PkgrelPolicy,

  /// Drop the interpreter's own package from generated dependency lists
  #[serde(default = "default_true")]
  pub filter_interpreter_dependency: bool,

  /// Package name of the interpreter itself (default: "python")
  #[serde(default = "default_interpreter_package")]
  pub interpreter_package: String,
}

fn default_true() -> bool {
  true
}

fn default_interpreter_package() -> String {
  "python".to_string()
}

impl Default for PolicyConfig {
  fn default() -> Self {
    Self {
      pkgrel: PkgrelPolicy::default(),
      filter_interpreter_dependency: true,
      interpreter_package: default_interpreter_package(),
    }
  }
}

/// Executables used for the external steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
  #[serde(default = "default_python")]
  pub python: String,
  #[serde(default = "default_git")]
  pub git: String,
  #[serde(default = "default_makepkg")]
  pub makepkg: String,
}

fn default_python() -> String {
  "python3".to_string()
}

fn default_git() -> String {
  "git".to_string()
}

fn default_makepkg() -> String {
  "makepkg".to_string()
}

impl Default for ToolsConfig {
  fn default() -> Self {
    Self {
      python: default_python(),
      git: default_git(),
      makepkg: default_makepkg(),
    }
  }
}

fn invalid(field: &str, reason: impl Into<String>) -> DeployError {
  DeployError::Config(ConfigError::Invalid {
    field: field.to_string(),
    reason: reason.into(),
  })
}

impl DeployConfig {
  /// Find config file in search order: deploy.toml, .deploy.toml, .config/deploy.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("deploy.toml"),
      path.join(".deploy.toml"),
      path.join(".config").join("deploy.toml"),
    ];

    candidates.into_iter().find(|p| p.is_file())
  }

  /// Load config for a project directory; no file means built-in defaults
  pub fn load(path: &Path) -> DeployResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      return Ok(Self::default());
    };

    let unreadable = |reason: String| {
      DeployError::Config(ConfigError::Unreadable {
        path: config_path.clone(),
        reason,
      })
    };

    let content = fs::read_to_string(&config_path).map_err(|e| unreadable(e.to_string()))?;
    let config: DeployConfig = toml_edit::de::from_str(&content).map_err(|e| unreadable(e.to_string()))?;

    config.validate()?;
    Ok(config)
  }

  /// Validate config values
  pub fn validate(&self) -> DeployResult<()> {
    if !self.index.listing_url.contains("{name}") {
      return Err(invalid("index.listing_url", "must contain the {name} placeholder"));
    }

    let repo = &self.repository;
    if !repo.listing_url.contains("{package}") {
      return Err(invalid("repository.listing_url", "must contain the {package} placeholder"));
    }
    if !repo.remote_url.contains("{package}") {
      return Err(invalid("repository.remote_url", "must contain the {package} placeholder"));
    }
    if repo.package_prefix.trim().is_empty() {
      return Err(invalid("repository.package_prefix", "must not be empty"));
    }
    if repo.workspace.as_os_str().is_empty() || repo.workspace.is_absolute() {
      return Err(invalid("repository.workspace", "must be a non-empty relative path"));
    }
    if repo.branch.trim().is_empty() {
      return Err(invalid("repository.branch", "must not be empty"));
    }
    if let Some(ref template) = repo.source_url_template
      && !template.contains("{version}")
    {
      return Err(invalid(
        "repository.source_url_template",
        "must contain the {version} placeholder",
      ));
    }

    if self.policy.interpreter_package.trim().is_empty() {
      return Err(invalid("policy.interpreter_package", "must not be empty"));
    }

    Ok(())
  }
}
