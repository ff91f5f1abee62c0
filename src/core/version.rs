//! Version values compared across channels
//!
//! Remote listings and project descriptors report free-form version strings
//! (`1.0`, `2.0.0rc1`, `0.8.6.post1`). They are parsed into a totally ordered
//! value following Python's release ordering:
//!
//! ```text
//! 1.0.dev1 < 1.0a1 < 1.0b2 < 1.0rc1 < 1.0rc10 < 1.0 < 1.0.post1 < 1.0.1
//! ```
//!
//! Anything that carries no numeric release is the "absent" sentinel, which
//! sorts below every real version.

use regex::Regex;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

/// Python release syntax (public part plus optional local label)
static RELEASE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?ix)^
    v?
    (?:(?P<epoch>[0-9]+)!)?
    (?P<release>[0-9]+(?:\.[0-9]+)*)
    (?:[-_.]?(?P<pre_l>alpha|a|beta|b|preview|pre|c|rc)[-_.]?(?P<pre_n>[0-9]+)?)?
    (?:-(?P<post_n1>[0-9]+)|[-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n2>[0-9]+)?)?
    (?:[-_.]?(?P<dev_l>dev)[-_.]?(?P<dev_n>[0-9]+)?)?
    (?:\+[a-z0-9]+(?:[-_.][a-z0-9]+)*)?
    $",
  )
  .expect("valid release pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
  Alpha,
  Beta,
  Candidate,
}

impl Phase {
  fn from_label(label: &str) -> Option<Self> {
    match label.to_ascii_lowercase().as_str() {
      "a" | "alpha" => Some(Phase::Alpha),
      "b" | "beta" => Some(Phase::Beta),
      "c" | "rc" | "pre" | "preview" => Some(Phase::Candidate),
      _ => None,
    }
  }
}

/// Pre-release slot; variant order is sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PreKey {
  /// `X.devN` with no pre or post part sorts before every pre-release of X
  DevOnly,
  Pre(Phase, u64),
  Final,
}

/// Development slot; a dev build sorts before the same version without one
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DevKey {
  Dev(u64),
  Released,
}

/// Comparison key; derived `Ord` compares fields in declaration order
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct VersionKey {
  epoch: u64,
  /// Trailing zeros trimmed so `1.0 == 1.0.0`
  release: Vec<u64>,
  pre: PreKey,
  post: Option<u64>,
  dev: DevKey,
}

impl VersionKey {
  fn new(epoch: u64, mut release: Vec<u64>, pre: Option<(Phase, u64)>, post: Option<u64>, dev: Option<u64>) -> Self {
    while release.len() > 1 && release.last() == Some(&0) {
      release.pop();
    }
    let pre = match (pre, post, dev) {
      (Some((phase, n)), _, _) => PreKey::Pre(phase, n),
      (None, None, Some(_)) => PreKey::DevOnly,
      _ => PreKey::Final,
    };
    Self {
      epoch,
      release,
      pre,
      post,
      dev: dev.map_or(DevKey::Released, DevKey::Dev),
    }
  }
}

/// A parsed version, or the "never published" sentinel
#[derive(Debug, Clone)]
pub struct SemanticVersion {
  raw: String,
  key: Option<VersionKey>,
}

impl SemanticVersion {
  /// The sentinel "0" version: not yet published
  pub fn absent() -> Self {
    Self {
      raw: "0".to_string(),
      key: None,
    }
  }

  /// Parse a free-form version string, falling back to the sentinel
  pub fn parse(input: &str) -> Self {
    let raw = input.trim();
    match parse_release(raw).or_else(|| parse_semver(raw)).or_else(|| parse_numeric_prefix(raw)) {
      Some(key) => Self {
        raw: raw.to_string(),
        key: Some(key),
      },
      None => Self::absent(),
    }
  }

  /// Whether this is the sentinel
  pub fn is_absent(&self) -> bool {
    self.key.is_none()
  }

  /// The string as reported by its source (used verbatim in recipes and commits)
  pub fn as_str(&self) -> &str {
    &self.raw
  }
}

fn number(text: Option<regex::Match<'_>>) -> Option<u64> {
  text.and_then(|m| m.as_str().parse().ok())
}

fn parse_release(raw: &str) -> Option<VersionKey> {
  let caps = RELEASE_PATTERN.captures(raw)?;

  let mut release = Vec::new();
  for part in caps.name("release")?.as_str().split('.') {
    release.push(part.parse::<u64>().ok()?);
  }

  let pre = match caps.name("pre_l") {
    Some(label) => Some((Phase::from_label(label.as_str())?, number(caps.name("pre_n")).unwrap_or(0))),
    None => None,
  };
  let post = if caps.name("post_n1").is_some() || caps.name("post_l").is_some() {
    Some(number(caps.name("post_n1")).or(number(caps.name("post_n2"))).unwrap_or(0))
  } else {
    None
  };
  let dev = caps
    .name("dev_l")
    .map(|_| number(caps.name("dev_n")).unwrap_or(0));

  Some(VersionKey::new(
    number(caps.name("epoch")).unwrap_or(0),
    release,
    pre,
    post,
    dev,
  ))
}

/// Strict semver with a pre-release tag Python syntax does not cover
/// (`1.0.0-x.7`); unknown tags sort as the earliest alpha
fn parse_semver(raw: &str) -> Option<VersionKey> {
  let version = semver::Version::parse(raw.strip_prefix('v').unwrap_or(raw)).ok()?;
  let pre = (!version.pre.is_empty()).then(|| {
    let tag = version.pre.as_str();
    let label: String = tag.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let n = tag
      .rsplit(|c: char| !c.is_ascii_digit())
      .find(|part| !part.is_empty())
      .and_then(|part| part.parse().ok())
      .unwrap_or(0);
    match Phase::from_label(&label) {
      Some(phase) => (phase, n),
      None => (Phase::Alpha, 0),
    }
  });
  Some(VersionKey::new(
    0,
    vec![version.major, version.minor, version.patch],
    pre,
    None,
    None,
  ))
}

/// Last resort: the dotted numeric prefix, anything after it ignored
fn parse_numeric_prefix(raw: &str) -> Option<VersionKey> {
  let trimmed = raw.strip_prefix('v').unwrap_or(raw);
  let end = trimmed
    .find(|c: char| !(c.is_ascii_digit() || c == '.'))
    .unwrap_or(trimmed.len());
  let release = trimmed[..end].trim_end_matches('.');
  if release.is_empty() {
    return None;
  }

  let mut numbers = Vec::new();
  for part in release.split('.') {
    numbers.push(part.parse::<u64>().ok()?);
  }
  Some(VersionKey::new(0, numbers, None, None, None))
}

impl PartialEq for SemanticVersion {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for SemanticVersion {}

impl PartialOrd for SemanticVersion {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for SemanticVersion {
  fn cmp(&self, other: &Self) -> Ordering {
    // None (absent) sorts below every Some
    self.key.cmp(&other.key)
  }
}

impl fmt::Display for SemanticVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.raw)
  }
}

impl Serialize for SemanticVersion {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.raw)
  }
}
