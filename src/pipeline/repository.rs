//! Repository channel (AUR): recipe, .SRCINFO, commit, push
//!
//! The recipe is only ever touched once a source archive checksum has been
//! computed in this run. A package the repository has never seen gets a
//! freshly generated recipe (then an operator review); a tracked package gets
//! its existing recipe patched, cloning the workspace first if it is missing.

use super::artifact::{ArtifactBuilder, BuildArtifact, find_source_archive};
use super::confirm::Confirm;
use super::{ChannelPublisher, Publication};
use crate::core::config::PkgrelPolicy;
use crate::core::context::ProjectContext;
use crate::core::error::{DeployError, DeployResult, Step};
use crate::core::exec::{Toolchain, run_step};
use crate::core::progress::progress;
use crate::core::vcs::RecipeRepo;
use crate::oracle::{Channel, ChannelState};
use crate::project::{declared_requirements, dependency_set};
use crate::recipe::{RECIPE_FILE, RecipeTemplate, RecipeUpdate, SUMMARY_FILE, TemplateValues, store, template};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

/// Name given to the remote of a newly created workspace
pub const REMOTE_NAME: &str = "aur";

/// Publishes the recipe for the project's current version
pub struct RepositoryPublisher<'a> {
  ctx: &'a ProjectContext,
  tools: &'a Toolchain,
  state: &'a ChannelState,
  /// Merged into the dependency set of a newly generated recipe
  extra_dependencies: &'a BTreeSet<String>,
  /// Rebuild even if a source archive is present (its build in this run failed)
  force_rebuild: bool,
}

impl<'a> RepositoryPublisher<'a> {
  pub fn new(
    ctx: &'a ProjectContext,
    tools: &'a Toolchain,
    state: &'a ChannelState,
    extra_dependencies: &'a BTreeSet<String>,
  ) -> Self {
    Self {
      ctx,
      tools,
      state,
      extra_dependencies,
      force_rebuild: false,
    }
  }

  pub fn with_force_rebuild(mut self, force_rebuild: bool) -> Self {
    self.force_rebuild = force_rebuild;
    self
  }

  fn version(&self) -> &str {
    self.ctx.metadata.version.as_str()
  }

  /// Source archive for this version, built first if missing or untrusted
  fn ensure_artifact(&self) -> DeployResult<BuildArtifact> {
    let builder = ArtifactBuilder::new(
      self.tools.python.as_ref(),
      self.tools.twine.as_ref(),
      &self.ctx.root,
      Channel::Repository,
    );
    let name = &self.ctx.metadata.name;

    let present = find_source_archive(&self.ctx.dist_dir(), name, self.version()).is_some();
    if self.force_rebuild || !present {
      progress!("   Source archive missing or stale, building it");
      builder.build_and_verify()?;
    }

    progress!("   Calculating SHA-256 of the source archive");
    builder.source_artifact(name, self.version())
  }

  /// First publication: fresh workspace, recipe from template. Returns the repo
  /// and whether a recipe was generated.
  fn prepare_new_package(&self, artifact: &BuildArtifact) -> DeployResult<(RecipeRepo<'a>, bool)> {
    let workspace = self.ctx.workspace_dir();
    let remote_url = self.ctx.config.repository.remote_url_for(&self.ctx.metadata.name);

    let repo = if workspace.join(".git").exists() {
      RecipeRepo::open(self.tools.git.as_ref(), &workspace)
    } else {
      progress!("   Initializing recipe workspace {}", workspace.display());
      RecipeRepo::init(self.tools.git.as_ref(), &workspace)?
    };
    repo.add_remote(REMOTE_NAME, &remote_url)?;

    let recipe_path = workspace.join(RECIPE_FILE);
    if recipe_path.is_file() {
      info!(path = %recipe_path.display(), "recipe already present, patching it");
      self.patch_recipe(&recipe_path, artifact)?;
      return Ok((repo, false));
    }

    self.generate_recipe(&recipe_path, artifact)?;
    Ok((repo, true))
  }

  /// Tracked package: patch the recipe, cloning the workspace if needed
  fn prepare_tracked_package(&self, artifact: &BuildArtifact) -> DeployResult<RecipeRepo<'a>> {
    let workspace = self.ctx.workspace_dir();
    let repo = if workspace.is_dir() {
      RecipeRepo::open(self.tools.git.as_ref(), &workspace)
    } else {
      let remote_url = self.ctx.config.repository.remote_url_for(&self.ctx.metadata.name);
      progress!("   Cloning {} into {}", remote_url, workspace.display());
      RecipeRepo::clone_into(self.tools.git.as_ref(), &remote_url, &workspace)?
    };

    self.patch_recipe(&workspace.join(RECIPE_FILE), artifact)?;
    Ok(repo)
  }

  fn patch_recipe(&self, path: &Path, artifact: &BuildArtifact) -> DeployResult<()> {
    let repository = &self.ctx.config.repository;
    let update = RecipeUpdate {
      name: &self.ctx.metadata.name,
      version: self.version(),
      checksum: &artifact.sha256,
      source_url_template: repository.source_url_template.as_deref(),
      reset_pkgrel: self.ctx.config.policy.pkgrel == PkgrelPolicy::AlwaysReset,
    };

    progress!("   Updating {} to {}", path.display(), self.version());
    store::patch_file(path, &update)?;
    Ok(())
  }

  fn generate_recipe(&self, path: &Path, artifact: &BuildArtifact) -> DeployResult<()> {
    let config = &self.ctx.config;
    let metadata = &self.ctx.metadata;

    let declared = declared_requirements(self.tools.python.as_ref(), &self.ctx.root)?;
    let depends = dependency_set(&declared, self.extra_dependencies, &config.repository, &config.policy);
    progress!("   {} dependencies", depends.len());
    for dep in &depends {
      progress!("     - {}", dep);
    }

    let source = template::source_url(
      config.repository.source_url_template.as_deref(),
      &metadata.name,
      self.version(),
    );
    let package = self.ctx.package_name();
    let values = TemplateValues {
      name: &metadata.name,
      package: &package,
      version: self.version(),
      description: &metadata.description,
      depends: &depends,
      source: &source,
      checksum: &artifact.sha256,
      maintainer: config.repository.maintainer.as_deref(),
    };

    let generate_failure = |detail: String| DeployError::step(Channel::Repository, Step::Generate, None, detail);
    let recipe = RecipeTemplate::load(&config.repository, &self.ctx.root)?
      .render(&values)
      .map_err(generate_failure)?;
    store::write_atomic(path, &recipe.render())
      .map_err(|e| generate_failure(format!("{}: {}", path.display(), e)))?;

    progress!("📝 Generated {}", path.display());
    Ok(())
  }

  /// `makepkg --printsrcinfo` into `.SRCINFO`
  fn write_summary(&self, workspace: &Path) -> DeployResult<()> {
    progress!("   Writing {}", SUMMARY_FILE);
    let output = run_step(
      self.tools.makepkg.as_ref(),
      Channel::Repository,
      Step::Summary,
      &["--printsrcinfo"],
      workspace,
    )?;
    let path = workspace.join(SUMMARY_FILE);
    store::write_atomic(&path, &output.stdout_str()).map_err(|e| {
      DeployError::step(Channel::Repository, Step::Summary, None, format!("{}: {}", path.display(), e))
    })
  }

  fn register_submodule(&self) {
    let git = self.tools.git.as_ref();
    let workspace = &self.ctx.config.repository.workspace;

    if !RecipeRepo::is_repository(git, &self.ctx.root) {
      progress!(
        "⚠️  {} is not a git repository, not registering {} as a submodule",
        self.ctx.root.display(),
        workspace.display()
      );
      return;
    }

    let remote_url = self.ctx.config.repository.remote_url_for(&self.ctx.metadata.name);
    match RecipeRepo::add_submodule(git, &self.ctx.root, &remote_url, workspace) {
      Ok(()) => progress!("   Registered submodule {}", workspace.display()),
      Err(e) => {
        warn!(error = %e, "submodule registration failed");
        progress!("⚠️  Could not register submodule {}: {}", workspace.display(), e);
      }
    }
  }
}

impl ChannelPublisher for RepositoryPublisher<'_> {
  fn channel(&self) -> Channel {
    Channel::Repository
  }

  fn publish(&mut self, confirm: &dyn Confirm) -> DeployResult<Publication> {
    let artifact = self.ensure_artifact()?;

    let (repo, created) = if self.state.exists {
      (self.prepare_tracked_package(&artifact)?, false)
    } else {
      progress!("🆕 {} is new to {}", self.ctx.package_name(), Channel::Repository.label());
      self.prepare_new_package(&artifact)?
    };

    if created && !confirm.confirm("Review the generated PKGBUILD; continue with commit and push?") {
      return Ok(Publication::Declined);
    }

    self.write_summary(repo.workdir())?;

    let branch = repo.ensure_branch(&self.ctx.config.repository.branch)?;
    repo.stage(&[RECIPE_FILE, SUMMARY_FILE])?;

    let message = format!("Updated to v{}", self.version());
    progress!("   Committing: {}", message);
    if !repo.commit(&message)? {
      progress!("   Nothing to commit, pushing existing history");
    }

    let remote = repo.primary_remote()?;
    progress!("   Pushing to {}/{}", remote, branch);
    repo.push_upstream(&remote, &branch)?;

    if created {
      self.register_submodule();
    }
    Ok(Publication::Completed)
  }
}
