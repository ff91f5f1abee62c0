//! Initial recipe for a package the repository has never published

use super::RecipeFile;
use crate::core::config::RepositoryConfig;
use crate::core::error::{DeployError, DeployResult, Step};
use crate::oracle::Channel;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

const BUILTIN_TEMPLATE: &str = r#"# Maintainer: {maintainer}

_name={name}
pkgname={package}
pkgver={version}
pkgrel=1
pkgdesc="{description}"
arch=('any')
url="https://pypi.org/project/{name}/"
license=('custom:unknown')
depends=({depends})
makedepends=('python-setuptools')
source=("{source}")
sha256sums=("{checksum}")

build() {
    cd "$srcdir/$_name-$pkgver"
    python setup.py build
}

package() {
    cd "$srcdir/$_name-$pkgver"
    python setup.py install --root="$pkgdir" --optimize=1 --skip-build
}
"#;

/// Values substituted into a template
#[derive(Debug)]
pub struct TemplateValues<'a> {
  pub name: &'a str,
  pub package: &'a str,
  pub version: &'a str,
  pub description: &'a str,
  pub depends: &'a BTreeSet<String>,
  pub source: &'a str,
  pub checksum: &'a str,
  /// Lines mentioning `{maintainer}` are dropped when unset
  pub maintainer: Option<&'a str>,
}

/// Recipe template text with `{placeholder}` fields
#[derive(Debug, Clone)]
pub struct RecipeTemplate {
  text: String,
}

impl RecipeTemplate {
  pub fn builtin() -> Self {
    Self {
      text: BUILTIN_TEMPLATE.to_string(),
    }
  }

  pub fn from_text(text: impl Into<String>) -> Self {
    Self { text: text.into() }
  }

  /// Template named by `[repository] template` (relative to the project), else the built-in one
  pub fn load(config: &RepositoryConfig, project_dir: &Path) -> DeployResult<Self> {
    let Some(ref template) = config.template else {
      return Ok(Self::builtin());
    };

    let path = project_dir.join(template);
    let text = fs::read_to_string(&path).map_err(|e| {
      DeployError::step(
        Channel::Repository,
        Step::Generate,
        None,
        format!("cannot read recipe template {}: {}", path.display(), e),
      )
    })?;
    Ok(Self::from_text(text))
  }

  /// Substitute `values` and parse the result
  ///
  /// The rendered recipe must carry `pkgver=` and `sha256sums=(` directives so
  /// later releases can be patched into it.
  pub fn render(&self, values: &TemplateValues<'_>) -> Result<RecipeFile, String> {
    let depends = values
      .depends
      .iter()
      .map(|dep| format!("'{}'", dep))
      .collect::<Vec<_>>()
      .join(" ");

    let mut text = String::with_capacity(self.text.len());
    for line in self.text.split_inclusive('\n') {
      if values.maintainer.is_none() && line.contains("{maintainer}") {
        continue;
      }
      text.push_str(line);
    }

    let text = text
      .replace("{maintainer}", values.maintainer.unwrap_or_default())
      .replace("{package}", values.package)
      .replace("{version}", values.version)
      .replace("{description}", &escape_double_quoted(values.description))
      .replace("{depends}", &depends)
      .replace("{source}", values.source)
      .replace("{checksum}", values.checksum)
      .replace("{name}", values.name);

    let recipe = RecipeFile::parse(&text);
    for kind in [super::DirectiveKind::Pkgver, super::DirectiveKind::Sha256sums] {
      if recipe.directive_value(kind).is_none() {
        return Err(format!("template has no `{}` line", kind.prefix()));
      }
    }
    Ok(recipe)
  }
}

/// Source URL for a new recipe: the configured template, else the index's file host
pub fn source_url(template: Option<&str>, name: &str, version: &str) -> String {
  match template {
    Some(template) => super::patch::expand_source_url(template, name, version),
    None => default_source_url(name),
  }
}

/// Source archive URL on the index's file host
///
/// The version is left as `$pkgver` so the entry follows later `pkgver` patches.
pub fn default_source_url(name: &str) -> String {
  let initial = name.chars().next().unwrap_or('_');
  format!(
    "https://files.pythonhosted.org/packages/source/{}/{}/{}-$pkgver.tar.gz",
    initial, name, name
  )
}

fn escape_double_quoted(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  for c in value.chars() {
    if matches!(c, '"' | '$' | '`' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}
