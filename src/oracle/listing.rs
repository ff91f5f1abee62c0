//! Version extraction from listing page HTML

use super::Channel;
use regex::Regex;
use std::sync::LazyLock;

/// PyPI: `<h1 class="package-header__name">name 1.2.3</h1>`
static INDEX_HEADER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?s)<h1[^>]*class="[^"]*package-header__name[^"]*"[^>]*>(.*?)</h1>"#).expect("valid index header pattern")
});

/// AUR: `<div id="pkgdetails"> ... <h2>Package Details: python-name 1.2.3-1</h2>`
static REPOSITORY_HEADER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?s)<div[^>]*id="pkgdetails"[^>]*>.*?<h2[^>]*>(.*?)</h2>"#).expect("valid repository header pattern")
});

/// Text shown on pages served with 200 for packages that do not exist
const ABSENCE_MARKERS: &[&str] = &["Page Not Found", "No packages matched your search criteria"];

#[derive(Debug, PartialEq, Eq)]
pub(super) enum Extracted {
  Version(String),
  Absent,
  Unrecognized,
}

/// Pull the published version string out of a listing page
pub(super) fn extract_version(channel: Channel, body: &str) -> Extracted {
  let pattern = match channel {
    Channel::Index => &*INDEX_HEADER,
    Channel::Repository => &*REPOSITORY_HEADER,
  };

  let Some(captures) = pattern.captures(body) else {
    if ABSENCE_MARKERS.iter().any(|marker| body.contains(marker)) {
      return Extracted::Absent;
    }
    return Extracted::Unrecognized;
  };

  // Header text is "<name> <version>"; the version is the last token
  match captures[1].split_whitespace().last() {
    Some(version) => Extracted::Version(version.to_string()),
    None => Extracted::Unrecognized,
  }
}

/// Drop the epoch and package release from a repository version (`1:2.0-3` → `2.0`)
pub(super) fn strip_package_release(raw: &str) -> &str {
  let without_epoch = raw.split_once(':').map(|(_, rest)| rest).unwrap_or(raw);
  without_epoch
    .rsplit_once('-')
    .map(|(version, _)| version)
    .unwrap_or(without_epoch)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_index_header_with_whitespace() {
    let page = "<h1 class=\"package-header__name\">\n      requests 2.31.0\n    </h1>";
    assert_eq!(
      extract_version(Channel::Index, page),
      Extracted::Version("2.31.0".to_string())
    );
  }

  #[test]
  fn test_repository_header() {
    let page = "<div id=\"pkgdetails\" class=\"box\">\n<h2>Package Details: python-requests 2.31.0-3</h2>";
    assert_eq!(
      extract_version(Channel::Repository, page),
      Extracted::Version("2.31.0-3".to_string())
    );
  }

  #[test]
  fn test_absence_and_unrecognized_pages() {
    assert_eq!(
      extract_version(Channel::Repository, "<h1>Page Not Found</h1>"),
      Extracted::Absent
    );
    assert_eq!(extract_version(Channel::Index, "<html></html>"), Extracted::Unrecognized);
    assert_eq!(
      extract_version(Channel::Index, "<h1 class=\"package-header__name\">  </h1>"),
      Extracted::Unrecognized
    );
  }

  #[test]
  fn test_strip_package_release() {
    assert_eq!(strip_package_release("2.31.0-3"), "2.31.0");
    assert_eq!(strip_package_release("1:2.0-1"), "2.0");
    assert_eq!(strip_package_release("0.8.6"), "0.8.6");
  }
}
