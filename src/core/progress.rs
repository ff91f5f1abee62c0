//! Operator-facing progress lines
//!
//! Progress normally goes to stdout. With `--json` stdout carries only the
//! report, so progress moves to stderr.

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

static ON_STDERR: AtomicBool = AtomicBool::new(false);

/// Route progress to stderr (`true`) or stdout (`false`) for the rest of the run
pub fn route_to_stderr(enabled: bool) {
  ON_STDERR.store(enabled, Ordering::Relaxed);
}

pub fn on_stderr() -> bool {
  ON_STDERR.load(Ordering::Relaxed)
}

/// Write one progress line
pub fn line(args: fmt::Arguments<'_>) {
  if on_stderr() {
    eprintln!("{}", args);
  } else {
    println!("{}", args);
  }
}

/// Write a prompt without a line break and flush it
pub fn prompt(args: fmt::Arguments<'_>) {
  if on_stderr() {
    let mut err = io::stderr().lock();
    write!(err, "{}", args).and_then(|_| err.flush()).ok();
  } else {
    let mut out = io::stdout().lock();
    write!(out, "{}", args).and_then(|_| out.flush()).ok();
  }
}

/// `println!` for progress lines
macro_rules! progress {
  () => {
    $crate::core::progress::line(format_args!(""))
  };
  ($($arg:tt)*) => {
    $crate::core::progress::line(format_args!($($arg)*))
  };
}

pub(crate) use progress;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_route_switches_stream() {
    route_to_stderr(true);
    assert!(on_stderr());
    progress!("   routed to stderr");
    route_to_stderr(false);
    assert!(!on_stderr());
  }
}
