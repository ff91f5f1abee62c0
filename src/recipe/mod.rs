//! PKGBUILD recipe handling
//!
//! A recipe is an ordered list of lines. A handful of lines are directives the
//! deployment rewrites (`pkgver=`, `pkgrel=`, `source=(`, `sha256sums=(`);
//! everything else passes through byte-for-byte, line terminators included.
//!
//! - **patch**: pure `RecipeFile -> RecipeFile` version update
//! - **template**: initial recipe for a package the repository has never seen
//! - **store**: all-or-nothing reads and writes of recipe files

pub mod patch;
pub mod store;
pub mod template;

pub use patch::{RecipeUpdate, apply_version_update};
pub use template::{RecipeTemplate, TemplateValues};

/// Recipe filename inside the workspace
pub const RECIPE_FILE: &str = "PKGBUILD";

/// Derived metadata summary filename inside the workspace
pub const SUMMARY_FILE: &str = ".SRCINFO";

/// Recognized directive keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
  Pkgver,
  Pkgrel,
  Source,
  Sha256sums,
}

impl DirectiveKind {
  /// Line prefix that introduces this directive (column 0 only)
  pub fn prefix(self) -> &'static str {
    match self {
      DirectiveKind::Pkgver => "pkgver=",
      DirectiveKind::Pkgrel => "pkgrel=",
      DirectiveKind::Source => "source=(",
      DirectiveKind::Sha256sums => "sha256sums=(",
    }
  }

  const ALL: [DirectiveKind; 4] = [
    DirectiveKind::Pkgver,
    DirectiveKind::Pkgrel,
    DirectiveKind::Source,
    DirectiveKind::Sha256sums,
  ];

  fn classify(content: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|kind| content.starts_with(kind.prefix()))
  }
}

/// One line of a recipe, split from its terminator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeLine {
  /// Line text without the terminator
  pub content: String,
  /// `"\n"`, `"\r\n"` or `""` (last line without newline)
  pub terminator: String,
  /// Directive classification, `None` for passthrough text
  pub directive: Option<DirectiveKind>,
}

impl RecipeLine {
  fn new(content: String, terminator: String) -> Self {
    let directive = DirectiveKind::classify(&content);
    Self {
      content,
      terminator,
      directive,
    }
  }

  /// Same line with new content, keeping the terminator and re-classifying
  pub fn with_content(&self, content: String) -> Self {
    Self::new(content, self.terminator.clone())
  }
}

/// Parsed recipe file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeFile {
  lines: Vec<RecipeLine>,
}

impl RecipeFile {
  /// Split text into classified lines; `render(parse(s)) == s` for any input
  pub fn parse(text: &str) -> Self {
    let lines = text
      .split_inclusive('\n')
      .map(|raw| {
        if let Some(body) = raw.strip_suffix("\r\n") {
          RecipeLine::new(body.to_string(), "\r\n".to_string())
        } else if let Some(body) = raw.strip_suffix('\n') {
          RecipeLine::new(body.to_string(), "\n".to_string())
        } else {
          RecipeLine::new(raw.to_string(), String::new())
        }
      })
      .collect();
    Self { lines }
  }

  pub fn from_lines(lines: Vec<RecipeLine>) -> Self {
    Self { lines }
  }

  pub fn lines(&self) -> &[RecipeLine] {
    &self.lines
  }

  pub fn len(&self) -> usize {
    self.lines.len()
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  /// First value of a directive (`pkgver=1.2.3  # c` → `1.2.3`)
  pub fn directive_value(&self, kind: DirectiveKind) -> Option<&str> {
    let line = self.lines.iter().find(|line| line.directive == Some(kind))?;
    let (start, end) = patch::scalar_value_span(&line.content, kind.prefix());
    Some(&line.content[start..end])
  }

  pub fn render(&self) -> String {
    let mut out = String::new();
    for line in &self.lines {
      out.push_str(&line.content);
      out.push_str(&line.terminator);
    }
    out
  }
}
