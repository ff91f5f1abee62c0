//! Remote version lookups
//!
//! The oracle asks each channel's public listing page which version of a
//! package is currently published. A package that is not listed resolves to
//! the sentinel version, so "never published" and "not found" are the same
//! thing to the pipelines. Only genuine faults (network errors, listing pages
//! that no longer parse) are reported as errors.

mod fetch;
mod listing;

pub use fetch::{HttpFetcher, Listing, ListingFetcher};

use crate::core::config::DeployConfig;
use crate::core::error::{DeployError, DeployResult, LookupError};
use crate::core::version::SemanticVersion;
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Publication target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
  /// Language package index (PyPI)
  Index,
  /// Distribution community repository (AUR)
  Repository,
}

impl Channel {
  pub fn as_str(self) -> &'static str {
    match self {
      Channel::Index => "index",
      Channel::Repository => "repository",
    }
  }

  /// Display label for operator output
  pub fn label(self) -> &'static str {
    match self {
      Channel::Index => "PyPI",
      Channel::Repository => "AUR",
    }
  }
}

impl fmt::Display for Channel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// What a channel currently publishes for the project
#[derive(Debug, Clone, Serialize)]
pub struct ChannelState {
  pub channel: Channel,
  pub remote_version: SemanticVersion,
  pub exists: bool,
}

impl ChannelState {
  pub fn new(channel: Channel, remote_version: SemanticVersion) -> Self {
    let exists = !remote_version.is_absent();
    Self {
      channel,
      remote_version,
      exists,
    }
  }
}

/// Resolves published versions through a [`ListingFetcher`]
pub struct VersionOracle<'a> {
  fetcher: &'a dyn ListingFetcher,
  config: &'a DeployConfig,
}

impl<'a> VersionOracle<'a> {
  pub fn new(fetcher: &'a dyn ListingFetcher, config: &'a DeployConfig) -> Self {
    Self { fetcher, config }
  }

  /// Listing URL of `package_name` on `channel`
  pub fn listing_url(&self, channel: Channel, package_name: &str) -> String {
    match channel {
      Channel::Index => self.config.index.listing_url.replace("{name}", package_name),
      Channel::Repository => self
        .config
        .repository
        .listing_url
        .replace("{package}", &self.config.repository.package_name(package_name)),
    }
  }

  /// Currently published version of `package_name`, or the sentinel when absent
  pub fn resolve_remote_version(&self, channel: Channel, package_name: &str) -> DeployResult<SemanticVersion> {
    let url = self.listing_url(channel, package_name);
    let lookup_failure = |reason: String| {
      DeployError::Lookup(LookupError {
        channel,
        url: url.clone(),
        reason,
      })
    };

    let body = match self.fetcher.fetch(&url).map_err(|e| lookup_failure(e.to_string()))? {
      Listing::Found(body) => body,
      Listing::Missing { status } => {
        info!(%channel, %url, status, "package not listed");
        return Ok(SemanticVersion::absent());
      }
    };

    let raw = match listing::extract_version(channel, &body) {
      listing::Extracted::Version(raw) => raw,
      listing::Extracted::Absent => {
        info!(%channel, %url, "listing reports no such package");
        return Ok(SemanticVersion::absent());
      }
      listing::Extracted::Unrecognized => {
        return Err(lookup_failure("listing page did not contain a version header".to_string()));
      }
    };

    let raw = match channel {
      Channel::Index => raw,
      Channel::Repository => listing::strip_package_release(&raw).to_string(),
    };

    let version = SemanticVersion::parse(&raw);
    info!(%channel, %url, version = %version, "resolved remote version");
    Ok(version)
  }

  /// Resolve and wrap into a [`ChannelState`]
  pub fn channel_state(&self, channel: Channel, package_name: &str) -> DeployResult<ChannelState> {
    Ok(ChannelState::new(
      channel,
      self.resolve_remote_version(channel, package_name)?,
    ))
  }
}
