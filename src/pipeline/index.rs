//! Index channel (PyPI): clean, build, verify, upload

use super::artifact::ArtifactBuilder;
use super::confirm::Confirm;
use super::{ChannelPublisher, Publication};
use crate::core::context::ProjectContext;
use crate::core::error::{DeployError, DeployResult, Step};
use crate::core::exec::{Toolchain, run_step};
use crate::core::progress::progress;
use crate::oracle::Channel;
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Where twine will find upload credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadCredentials {
  /// `TWINE_PASSWORD` is set (API token)
  Environment,
  /// `~/.pypirc`
  Pypirc(PathBuf),
}

impl UploadCredentials {
  /// Look at the process environment and the home directory
  pub fn discover() -> Option<Self> {
    let home = env::var_os("HOME")
      .or_else(|| env::var_os("USERPROFILE"))
      .map(PathBuf::from);
    Self::discover_with(|key| env::var(key).ok(), home)
  }

  pub fn discover_with(var: impl Fn(&str) -> Option<String>, home: Option<PathBuf>) -> Option<Self> {
    if var("TWINE_PASSWORD").is_some_and(|token| !token.trim().is_empty()) {
      return Some(UploadCredentials::Environment);
    }
    home
      .map(|home| home.join(".pypirc"))
      .filter(|path| path.is_file())
      .map(UploadCredentials::Pypirc)
  }

  pub fn describe(&self) -> String {
    match self {
      UploadCredentials::Environment => "TWINE_PASSWORD".to_string(),
      UploadCredentials::Pypirc(path) => path.display().to_string(),
    }
  }
}

/// Publishes the project's distributions to the index
pub struct IndexPublisher<'a> {
  ctx: &'a ProjectContext,
  tools: &'a Toolchain,
  credentials: Option<&'a UploadCredentials>,
}

impl<'a> IndexPublisher<'a> {
  pub fn new(ctx: &'a ProjectContext, tools: &'a Toolchain, credentials: Option<&'a UploadCredentials>) -> Self {
    Self {
      ctx,
      tools,
      credentials,
    }
  }
}

impl ChannelPublisher for IndexPublisher<'_> {
  fn channel(&self) -> Channel {
    Channel::Index
  }

  fn publish(&mut self, _confirm: &dyn Confirm) -> DeployResult<Publication> {
    let Some(credentials) = self.credentials else {
      return Err(DeployError::step(
        Channel::Index,
        Step::Credentials,
        None,
        "no upload credentials: TWINE_PASSWORD is unset and ~/.pypirc does not exist",
      ));
    };
    info!(credentials = %credentials.describe(), "using upload credentials");

    let builder = ArtifactBuilder::new(
      self.tools.python.as_ref(),
      self.tools.twine.as_ref(),
      &self.ctx.root,
      Channel::Index,
    );
    let files = builder.build_and_verify()?;

    progress!("   Uploading {} file(s) with twine", files.len());
    let mut args = vec!["upload", "--non-interactive"];
    args.extend(files.iter().map(String::as_str));
    run_step(
      self.tools.twine.as_ref(),
      Channel::Index,
      Step::Upload,
      &args,
      &self.ctx.root,
    )?;

    Ok(Publication::Completed)
  }
}
