//! Per-channel publication state machine
//!
//! ```text
//! CheckNeeded ──(local ≤ remote)──────────────────────────► Succeeded (up to date)
//!      │
//!      ├──(force)────────────────────────┐
//!      │                                 ▼
//!      └──(local > remote)──► AwaitingConfirmation ──(yes)──► Publishing ──► Succeeded | Failed
//!                                        │                        │
//!                                        └──(no)──► Aborted ◄─────┘ (declined review)
//! ```
//!
//! [`drive`] owns the transitions; a [`ChannelPublisher`] supplies the
//! channel-specific `Publishing` work.

pub mod artifact;
pub mod confirm;
pub mod index;
pub mod repository;

pub use confirm::{AutoConfirm, Confirm, StdinConfirm};
pub use index::{IndexPublisher, UploadCredentials};
pub use repository::RepositoryPublisher;

use crate::core::error::{DeployError, DeployResult};
use crate::core::progress::progress;
use crate::core::version::SemanticVersion;
use crate::oracle::{Channel, ChannelState};
use serde::Serialize;
use tracing::{info, warn};

/// Pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
  CheckNeeded,
  AwaitingConfirmation,
  Publishing,
  Succeeded,
  Aborted,
  Failed,
}

impl PipelineState {
  pub fn is_terminal(self) -> bool {
    matches!(self, PipelineState::Succeeded | PipelineState::Aborted | PipelineState::Failed)
  }
}

/// How a channel's pipeline ended
#[derive(Debug)]
pub enum Outcome {
  /// Remote already has this version (or a newer one)
  UpToDate,
  Published,
  /// Operator declined; not an error
  Aborted,
  Failed(DeployError),
}

impl Outcome {
  pub fn terminal_state(&self) -> PipelineState {
    match self {
      Outcome::UpToDate | Outcome::Published => PipelineState::Succeeded,
      Outcome::Aborted => PipelineState::Aborted,
      Outcome::Failed(_) => PipelineState::Failed,
    }
  }

  pub fn is_failed(&self) -> bool {
    matches!(self, Outcome::Failed(_))
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Outcome::UpToDate => "up_to_date",
      Outcome::Published => "published",
      Outcome::Aborted => "aborted",
      Outcome::Failed(_) => "failed",
    }
  }

  pub fn error(&self) -> Option<&DeployError> {
    match self {
      Outcome::Failed(e) => Some(e),
      _ => None,
    }
  }
}

/// Result of the `Publishing` state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publication {
  Completed,
  /// Operator declined a gate inside the publish sequence
  Declined,
}

/// Channel-specific publish sequence
pub trait ChannelPublisher {
  fn channel(&self) -> Channel;

  /// Run the publish steps; the first failing step is the `Err`
  fn publish(&mut self, confirm: &dyn Confirm) -> DeployResult<Publication>;
}

/// Record of one channel's pass through the state machine
#[derive(Debug)]
pub struct PipelineRun {
  pub channel: Channel,
  /// `None` when the remote lookup itself failed
  pub remote_version: Option<SemanticVersion>,
  /// States visited, in order; the last one is terminal
  pub history: Vec<PipelineState>,
  pub outcome: Outcome,
}

impl PipelineRun {
  /// Channel that failed before its version could be compared
  pub fn lookup_failed(channel: Channel, error: DeployError) -> Self {
    Self {
      channel,
      remote_version: None,
      history: vec![PipelineState::CheckNeeded, PipelineState::Failed],
      outcome: Outcome::Failed(error),
    }
  }

  pub fn final_state(&self) -> PipelineState {
    self.outcome.terminal_state()
  }
}

/// Gating rule: publish iff forced or the local version is strictly newer
pub fn needs_publish(local: &SemanticVersion, remote: &SemanticVersion, force: bool) -> bool {
  force || local > remote
}

/// Drive one channel from `CheckNeeded` to a terminal state
pub fn drive(
  publisher: &mut dyn ChannelPublisher,
  local: &SemanticVersion,
  state: &ChannelState,
  force: bool,
  confirm: &dyn Confirm,
) -> PipelineRun {
  let channel = publisher.channel();
  let mut history = vec![PipelineState::CheckNeeded];

  let finish = |mut history: Vec<PipelineState>, outcome: Outcome| {
    let terminal = outcome.terminal_state();
    history.push(terminal);
    info!(%channel, state = ?terminal, outcome = outcome.as_str(), "pipeline finished");
    PipelineRun {
      channel,
      remote_version: Some(state.remote_version.clone()),
      history,
      outcome,
    }
  };

  if !needs_publish(local, &state.remote_version, force) {
    progress!(
      "✅ {} is up to date ({} ≥ {})",
      channel.label(),
      state.remote_version,
      local
    );
    return finish(history, Outcome::UpToDate);
  }

  if force {
    progress!("⚠️  --force: publishing {} to {} without version check", local, channel.label());
  } else {
    history.push(PipelineState::AwaitingConfirmation);
    info!(%channel, local = %local, remote = %state.remote_version, "awaiting confirmation");
    let prompt = format!("Publish {} to {} (currently {})?", local, channel.label(), state.remote_version);
    if !confirm.confirm(&prompt) {
      progress!("⏭️  Skipped {}", channel.label());
      return finish(history, Outcome::Aborted);
    }
  }

  history.push(PipelineState::Publishing);
  info!(%channel, version = %local, "publishing");
  progress!("📦 Publishing {} to {}", local, channel.label());

  match publisher.publish(confirm) {
    Ok(Publication::Completed) => {
      progress!("✅ Published {} to {}", local, channel.label());
      finish(history, Outcome::Published)
    }
    Ok(Publication::Declined) => {
      progress!("⏭️  {} publication stopped by operator", channel.label());
      finish(history, Outcome::Aborted)
    }
    Err(e) => {
      warn!(%channel, kind = e.kind(), error = %e, "publication failed");
      finish(history, Outcome::Failed(e))
    }
  }
}
