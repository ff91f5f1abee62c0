//! HTTP access to listing pages

use crate::core::error::{DeployError, DeployResult};
use tracing::debug;

/// Outcome of fetching a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
  /// HTTP 200 with the page body
  Found(String),
  /// Any other status: the package is not listed
  Missing { status: u16 },
}

/// Read-only access to channel listing pages
pub trait ListingFetcher {
  /// GET `url`; transport faults are `Err`, non-200 responses are [`Listing::Missing`]
  fn fetch(&self, url: &str) -> DeployResult<Listing>;
}

/// Blocking reqwest client
pub struct HttpFetcher {
  client: reqwest::blocking::Client,
}

impl HttpFetcher {
  pub fn new() -> DeployResult<Self> {
    let client = reqwest::blocking::Client::builder()
      .user_agent(concat!("aur-deploy/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| DeployError::message(format!("Failed to create HTTP client: {}", e)))?;
    Ok(Self { client })
  }
}

impl ListingFetcher for HttpFetcher {
  fn fetch(&self, url: &str) -> DeployResult<Listing> {
    debug!(%url, "fetching listing");
    let response = self
      .client
      .get(url)
      .send()
      .map_err(|e| DeployError::message(format!("GET {} failed: {}", url, e)))?;

    let status = response.status();
    debug!(%url, status = status.as_u16(), "listing response");
    if status != reqwest::StatusCode::OK {
      return Ok(Listing::Missing {
        status: status.as_u16(),
      });
    }

    let body = response
      .text()
      .map_err(|e| DeployError::message(format!("Failed to read {}: {}", url, e)))?;
    Ok(Listing::Found(body))
  }
}
