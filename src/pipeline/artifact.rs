//! Distribution build output and its checksum

use crate::core::context::{BUILD_DIR, DIST_DIR};
use crate::core::error::{DeployError, DeployResult, Step};
use crate::core::exec::{Tool, run_step};
use crate::core::progress::progress;
use crate::oracle::Channel;
use crate::project::metadata::DESCRIPTOR_FILE;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// The source archive being published, with its content digest
///
/// Always computed from the file on disk in the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
  pub path: PathBuf,
  /// Lowercase hex SHA-256
  pub sha256: String,
}

impl BuildArtifact {
  pub fn from_file(path: &Path) -> io::Result<Self> {
    let bytes = fs::read(path)?;
    Ok(Self {
      path: path.to_path_buf(),
      sha256: hex::encode(Sha256::digest(&bytes)),
    })
  }
}

/// `dist/<name>-<version>.tar.gz`, also trying the underscore-normalized and
/// the lower-cased (PEP 625) names newer setuptools releases write
pub fn find_source_archive(dist_dir: &Path, name: &str, version: &str) -> Option<PathBuf> {
  let underscored = name.replace(['-', '.'], "_");
  let normalized = sdist_stem(name);
  [name, underscored.as_str(), normalized.as_str()]
    .into_iter()
    .map(|stem| dist_dir.join(format!("{}-{}.tar.gz", stem, version)))
    .find(|path| path.is_file())
}

/// Lower-case the name and collapse each run of `-`, `_` and `.` into one `_`
fn sdist_stem(name: &str) -> String {
  let mut stem = String::with_capacity(name.len());
  let mut in_separator = false;
  for c in name.chars() {
    if matches!(c, '-' | '_' | '.') {
      if !in_separator {
        stem.push('_');
      }
      in_separator = true;
    } else {
      stem.extend(c.to_lowercase());
      in_separator = false;
    }
  }
  stem
}

/// Cleans, builds and verifies the project's distributions
pub struct ArtifactBuilder<'a> {
  python: &'a dyn Tool,
  twine: &'a dyn Tool,
  project_dir: &'a Path,
  /// Channel named in step failures
  channel: Channel,
}

impl<'a> ArtifactBuilder<'a> {
  pub fn new(python: &'a dyn Tool, twine: &'a dyn Tool, project_dir: &'a Path, channel: Channel) -> Self {
    Self {
      python,
      twine,
      project_dir,
      channel,
    }
  }

  /// Remove stale `build/` and `dist/`
  pub fn clean(&self) -> DeployResult<()> {
    for name in [BUILD_DIR, DIST_DIR] {
      let dir = self.project_dir.join(name);
      if dir.exists() {
        progress!("   Removing {}", dir.display());
        fs::remove_dir_all(&dir).map_err(|e| {
          DeployError::step(self.channel, Step::Clean, None, format!("{}: {}", dir.display(), e))
        })?;
      }
    }
    Ok(())
  }

  pub fn build(&self) -> DeployResult<()> {
    progress!("   Building sdist and wheel");
    run_step(
      self.python,
      self.channel,
      Step::Build,
      &[DESCRIPTOR_FILE, "sdist", "bdist_wheel"],
      self.project_dir,
    )?;
    Ok(())
  }

  /// Files in `dist/`, relative to the project, sorted
  pub fn dist_files(&self) -> DeployResult<Vec<String>> {
    let dist = self.project_dir.join(DIST_DIR);
    let no_output = |detail: String| DeployError::step(self.channel, Step::Build, None, detail);

    let entries = fs::read_dir(&dist).map_err(|e| no_output(format!("{}: {}", dist.display(), e)))?;
    let mut files = Vec::new();
    for entry in entries {
      let entry = entry?;
      if entry.file_type()?.is_file() {
        files.push(format!("{}/{}", DIST_DIR, entry.file_name().to_string_lossy()));
      }
    }
    files.sort();

    if files.is_empty() {
      return Err(no_output(format!("build produced no files in {}", dist.display())));
    }
    Ok(files)
  }

  /// `twine check` over `files`
  pub fn verify(&self, files: &[String]) -> DeployResult<()> {
    progress!("   Checking {} distribution file(s) with twine", files.len());
    let mut args = vec!["check"];
    args.extend(files.iter().map(String::as_str));
    run_step(self.twine, self.channel, Step::Verify, &args, self.project_dir)?;
    Ok(())
  }

  /// Clean, build and verify; returns the verified dist files
  pub fn build_and_verify(&self) -> DeployResult<Vec<String>> {
    self.clean()?;
    self.build()?;
    let files = self.dist_files()?;
    self.verify(&files)?;
    info!(channel = %self.channel, files = files.len(), "distributions built and verified");
    Ok(files)
  }

  /// Checksum the source archive for `name`/`version` in `dist/`
  pub fn source_artifact(&self, name: &str, version: &str) -> DeployResult<BuildArtifact> {
    let dist = self.project_dir.join(DIST_DIR);
    let path = find_source_archive(&dist, name, version).ok_or_else(|| {
      DeployError::step(
        self.channel,
        Step::Checksum,
        None,
        format!("{}/{}-{}.tar.gz not found", dist.display(), name, version),
      )
    })?;

    let artifact = BuildArtifact::from_file(&path)
      .map_err(|e| DeployError::step(self.channel, Step::Checksum, None, format!("{}: {}", path.display(), e)))?;
    info!(path = %artifact.path.display(), sha256 = %artifact.sha256, "checksummed source archive");
    Ok(artifact)
  }
}
