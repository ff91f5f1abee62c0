//! Operator confirmation gate

use crate::core::progress::{self, progress};
use std::io;

/// A yes/no decision from the operator
pub trait Confirm {
  /// `true` to continue, `false` to decline
  fn confirm(&self, prompt: &str) -> bool;
}

/// Asks on the terminal; anything but `y`/`yes` declines
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
  fn confirm(&self, prompt: &str) -> bool {
    progress::prompt(format_args!("❓ {} [y/N] ", prompt));

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
      return false;
    }
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
  }
}

/// `--yes`: accepts every prompt without asking
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
  fn confirm(&self, prompt: &str) -> bool {
    progress!("❓ {} [y/N] y (--yes)", prompt);
    true
  }
}
