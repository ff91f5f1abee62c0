//! Recipe files on disk
//!
//! Writes never leave a half-written file behind: content goes to a temp file
//! in the target's directory which is then renamed over the target.

use super::patch::{RecipeUpdate, apply_version_update};
use super::RecipeFile;
use crate::core::error::{DeployError, DeployResult, PatchError, ResultExt};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

fn patch_error(path: &Path, reason: impl Into<String>) -> DeployError {
  DeployError::Patch(PatchError {
    path: path.to_path_buf(),
    reason: reason.into(),
  })
}

/// Read and parse a recipe
pub fn read_recipe(path: &Path) -> DeployResult<RecipeFile> {
  let text = fs::read_to_string(path).map_err(|e| patch_error(path, format!("cannot read: {}", e)))?;
  Ok(RecipeFile::parse(&text))
}

/// Mode for a file that did not exist before (temp files start owner-only)
#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
  use std::os::unix::fs::PermissionsExt;
  Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
  None
}

/// Replace `path` with `contents` in one rename
///
/// An existing target keeps its permissions.
pub fn write_atomic(path: &Path, contents: &str) -> DeployResult<()> {
  let dir = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };
  let permissions = match fs::metadata(path) {
    Ok(meta) => Some(meta.permissions()),
    Err(_) => new_file_permissions(),
  };

  let mut tmp = NamedTempFile::new_in(dir).with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
  if let Some(permissions) = permissions {
    tmp
      .as_file()
      .set_permissions(permissions)
      .with_context(|| format!("Failed to set permissions for {}", path.display()))?;
  }
  tmp.write_all(contents.as_bytes())?;
  tmp.flush()?;
  tmp.persist(path).map_err(|e| e.error)?;

  debug!(path = %path.display(), bytes = contents.len(), "wrote file");
  Ok(())
}

/// Read, patch and atomically rewrite the recipe at `path`
///
/// On any failure the file keeps its previous content.
pub fn patch_file(path: &Path, update: &RecipeUpdate<'_>) -> DeployResult<RecipeFile> {
  let recipe = read_recipe(path)?;
  let patched = apply_version_update(&recipe, update).map_err(|reason| patch_error(path, reason))?;
  write_atomic(path, &patched.render()).map_err(|e| patch_error(path, format!("cannot write: {}", e)))?;
  Ok(patched)
}
