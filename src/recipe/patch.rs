//! Version update of an existing recipe
//!
//! The update is a pure function over [`RecipeFile`]. Directive lines are
//! rewritten in place, nothing is inserted, removed or reordered, and applying
//! the same update twice gives the same text as applying it once.

use super::{DirectiveKind, RecipeFile, RecipeLine};

/// New upstream release to write into a recipe
#[derive(Debug, Clone)]
pub struct RecipeUpdate<'a> {
  /// Project name, substituted for `{name}` in the source template
  pub name: &'a str,
  /// New `pkgver`
  pub version: &'a str,
  /// Hex-encoded SHA-256 of the source archive
  pub checksum: &'a str,
  /// When set, `source=(...)` becomes this URL (`{name}`, `{version}` substituted)
  pub source_url_template: Option<&'a str>,
  /// Reset `pkgrel` to 1
  pub reset_pkgrel: bool,
}

impl RecipeUpdate<'_> {
  fn validate(&self) -> Result<(), String> {
    if self.version.is_empty()
      || self
        .version
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '-' | ':' | '/' | '#' | '"' | '\''))
    {
      return Err(format!("'{}' is not a valid pkgver", self.version));
    }
    if self.checksum.len() != 64 || !self.checksum.chars().all(|c| c.is_ascii_hexdigit()) {
      return Err(format!("'{}' is not a hex-encoded SHA-256 digest", self.checksum));
    }
    Ok(())
  }

  pub fn source_url(&self) -> Option<String> {
    self
      .source_url_template
      .map(|template| expand_source_url(template, self.name, self.version))
  }
}

/// Apply `update` to `recipe`, returning the rewritten recipe
///
/// Fails without producing output when the update is malformed or a list
/// directive spans several lines (rewriting it would have to drop lines).
pub fn apply_version_update(recipe: &RecipeFile, update: &RecipeUpdate<'_>) -> Result<RecipeFile, String> {
  update.validate()?;
  let source_url = update.source_url();
  let previous_version = recipe.directive_value(DirectiveKind::Pkgver).filter(|old| !old.is_empty());

  let lines = recipe
    .lines()
    .iter()
    .enumerate()
    .map(|(idx, line)| {
      let Some(kind) = line.directive else {
        return Ok(line.clone());
      };

      let content = match kind {
        DirectiveKind::Pkgver => replace_scalar(&line.content, kind.prefix(), update.version),
        DirectiveKind::Pkgrel if update.reset_pkgrel => replace_scalar(&line.content, kind.prefix(), "1"),
        DirectiveKind::Pkgrel => return Ok(line.clone()),
        DirectiveKind::Source => match &source_url {
          Some(url) => replace_list(&line.content, kind.prefix(), url)
            .ok_or_else(|| format!("line {}: source=( list does not close on the same line", idx + 1))?,
          // no template: a literal copy of the old pkgver moves with it
          None => match previous_version {
            Some(old) if old != update.version => replace_version_literal(&line.content, old, update.version),
            _ => return Ok(line.clone()),
          },
        },
        DirectiveKind::Sha256sums => replace_list(&line.content, kind.prefix(), update.checksum)
          .ok_or_else(|| format!("line {}: sha256sums=( list does not close on the same line", idx + 1))?,
      };

      Ok(line.with_content(content))
    })
    .collect::<Result<Vec<RecipeLine>, String>>()?;

  Ok(RecipeFile::from_lines(lines))
}

/// Substitute `{name}` and `{version}` in a source URL template
pub fn expand_source_url(template: &str, name: &str, version: &str) -> String {
  template.replace("{name}", name).replace("{version}", version)
}

/// Replace every standalone occurrence of `old` with `new`
///
/// An occurrence inside a longer version (`11.0` or `1.0.1` when `old` is
/// `1.0`) is left alone.
fn replace_version_literal(content: &str, old: &str, new: &str) -> String {
  let bytes = content.as_bytes();
  let mut out = String::with_capacity(content.len());
  let mut copied = 0;

  for (start, _) in content.match_indices(old) {
    let end = start + old.len();
    let joined_before = start > 0 && (bytes[start - 1].is_ascii_digit() || bytes[start - 1] == b'.');
    let joined_after = match bytes.get(end) {
      Some(b) if b.is_ascii_digit() => true,
      Some(b'.') => bytes.get(end + 1).is_some_and(|b| b.is_ascii_digit()),
      _ => false,
    };
    if joined_before || joined_after {
      continue;
    }
    out.push_str(&content[copied..start]);
    out.push_str(new);
    copied = end;
  }

  out.push_str(&content[copied..]);
  out
}

/// Byte span of a scalar directive's value: after `prefix`, up to whitespace or `#`
pub(super) fn scalar_value_span(content: &str, prefix: &str) -> (usize, usize) {
  let start = prefix.len();
  let end = content[start..]
    .find(|c: char| c.is_whitespace() || c == '#')
    .map(|offset| start + offset)
    .unwrap_or(content.len());
  (start, end)
}

fn replace_scalar(content: &str, prefix: &str, value: &str) -> String {
  let (start, end) = scalar_value_span(content, prefix);
  format!("{}{}{}", &content[..start], value, &content[end..])
}

/// Replace the parenthesized list after `prefix` with a single quoted value,
/// keeping anything after the closing paren. `None` if the list is unclosed.
fn replace_list(content: &str, prefix: &str, value: &str) -> Option<String> {
  let open = prefix.len() - 1;
  let close = closing_paren(content, prefix.len())?;
  Some(format!("{}(\"{}\"){}", &content[..open], value, &content[close + 1..]))
}

/// Index of the first `)` at or after `from` that is not inside quotes
fn closing_paren(content: &str, from: usize) -> Option<usize> {
  let mut quote: Option<char> = None;
  for (offset, c) in content[from..].char_indices() {
    match (quote, c) {
      (Some(q), c) if c == q => quote = None,
      (Some(_), _) => {}
      (None, '"' | '\'') => quote = Some(c),
      (None, ')') => return Some(from + offset),
      (None, _) => {}
    }
  }
  None
}
