//! Top-level deployment: index channel first, then the repository channel
//!
//! Channels run strictly one after the other. A failure ends only the channel
//! it happened in; the run's exit status is non-zero when any channel ended
//! `Failed`.

use crate::core::config::DeployConfig;
use crate::core::context::ProjectContext;
use crate::core::error::DeployResult;
use crate::core::exec::Toolchain;
use crate::core::progress::progress;
use crate::core::version::SemanticVersion;
use crate::oracle::{Channel, ChannelState, ListingFetcher, VersionOracle};
use crate::pipeline::{
  Confirm, IndexPublisher, Outcome, PipelineRun, PipelineState, RepositoryPublisher, UploadCredentials, drive,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

/// Run options from the command line
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
  /// Publish regardless of remote versions, without confirmation
  pub force: bool,
  /// Stop after the index channel
  pub skip_repository: bool,
  /// Extra dependency names for a newly generated recipe
  pub extra_dependencies: BTreeSet<String>,
}

/// External collaborators of a run
pub struct Collaborators<'a> {
  pub tools: &'a Toolchain,
  pub fetcher: &'a dyn ListingFetcher,
  pub confirm: &'a dyn Confirm,
  pub credentials: Option<&'a UploadCredentials>,
}

/// Everything that happened in one run
#[derive(Debug)]
pub struct RunSummary {
  pub project: String,
  pub version: SemanticVersion,
  pub runs: Vec<PipelineRun>,
}

impl RunSummary {
  pub fn failed(&self) -> bool {
    self.runs.iter().any(|run| run.outcome.is_failed())
  }

  /// 0 unless a channel failed; then the exit code of the first failure
  pub fn exit_code(&self) -> i32 {
    self
      .runs
      .iter()
      .find_map(|run| run.outcome.error())
      .map(|e| e.exit_code().as_i32())
      .unwrap_or(0)
  }

  pub fn report(&self) -> RunReport<'_> {
    RunReport {
      project: &self.project,
      version: &self.version,
      exit_code: self.exit_code(),
      channels: self
        .runs
        .iter()
        .map(|run| ChannelReport {
          channel: run.channel,
          remote_version: run.remote_version.as_ref(),
          states: &run.history,
          outcome: run.outcome.as_str(),
          error: run.outcome.error().map(|e| ErrorReport {
            kind: e.kind(),
            message: e.to_string(),
            help: e.help_message(),
          }),
        })
        .collect(),
    }
  }

  /// Operator-facing summary with failure details
  pub fn print(&self) {
    println!();
    println!("📊 Deployment summary for {} {}", self.project, self.version);
    for run in &self.runs {
      let icon = match run.final_state() {
        PipelineState::Failed => "❌",
        PipelineState::Aborted => "⏭️ ",
        _ => "✅",
      };
      println!("   {} {:<5} {}", icon, run.channel.label(), run.outcome.as_str());
      if let Some(e) = run.outcome.error() {
        println!("      {}", e);
        if let Some(help) = e.help_message() {
          println!("      💡 {}", help);
        }
      }
    }
  }
}

/// Serializable view of a [`RunSummary`] (`--json`)
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
  pub project: &'a str,
  pub version: &'a SemanticVersion,
  pub exit_code: i32,
  pub channels: Vec<ChannelReport<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ChannelReport<'a> {
  pub channel: Channel,
  pub remote_version: Option<&'a SemanticVersion>,
  pub states: &'a [PipelineState],
  pub outcome: &'static str,
  pub error: Option<ErrorReport>,
}

#[derive(Debug, Serialize)]
pub struct ErrorReport {
  pub kind: &'static str,
  pub message: String,
  pub help: Option<String>,
}

/// Load the project in `root` and run every channel
///
/// Fails only when the project itself cannot be read (missing descriptor);
/// channel failures are reported in the summary.
pub fn deploy(
  root: &Path,
  config: DeployConfig,
  options: &DeployOptions,
  collaborators: &Collaborators<'_>,
) -> DeployResult<RunSummary> {
  let ctx = ProjectContext::build(root, config, collaborators.tools.python.as_ref())?;
  Ok(run(&ctx, options, collaborators))
}

/// Run the index channel, then (unless skipped) the repository channel
pub fn run(ctx: &ProjectContext, options: &DeployOptions, collaborators: &Collaborators<'_>) -> RunSummary {
  let metadata = &ctx.metadata;
  progress!(
    "🔍 Deploying {} {} from {}",
    metadata.name,
    metadata.version,
    ctx.root.display()
  );

  let oracle = VersionOracle::new(collaborators.fetcher, &ctx.config);
  let local = &metadata.version;
  let mut runs = Vec::new();

  let index_run = match lookup(ctx, &oracle, Channel::Index, options.force) {
    Ok(state) => {
      let mut publisher = IndexPublisher::new(ctx, collaborators.tools, collaborators.credentials);
      finish(drive(&mut publisher, local, &state, options.force, collaborators.confirm))
    }
    Err(run) => run,
  };
  let index_failed = index_run.outcome.is_failed();
  runs.push(index_run);

  if options.skip_repository {
    progress!("⏭️  Skipping {} (--no-aur)", Channel::Repository.label());
  } else {
    let repository_run = match lookup(ctx, &oracle, Channel::Repository, options.force) {
      Ok(state) => {
        // a failed index build may have left a stale or partial archive behind
        let mut publisher = RepositoryPublisher::new(ctx, collaborators.tools, &state, &options.extra_dependencies)
          .with_force_rebuild(index_failed);
        finish(drive(&mut publisher, local, &state, options.force, collaborators.confirm))
      }
      Err(run) => run,
    };
    runs.push(repository_run);
  }

  RunSummary {
    project: metadata.name.clone(),
    version: metadata.version.clone(),
    runs,
  }
}

/// Resolve a channel's state; a failed lookup ends the channel unless forced
fn lookup(
  ctx: &ProjectContext,
  oracle: &VersionOracle<'_>,
  channel: Channel,
  force: bool,
) -> Result<ChannelState, PipelineRun> {
  progress!("🔍 Checking {}", channel.label());

  let state = match oracle.channel_state(channel, &ctx.metadata.name) {
    Ok(state) => state,
    Err(e) if force => {
      warn!(%channel, error = %e, "remote lookup failed, continuing because of --force");
      progress!("⚠️  {} (continuing because of --force)", e);
      ChannelState::new(channel, SemanticVersion::absent())
    }
    Err(e) => {
      progress!("❌ {}", e);
      return Err(PipelineRun::lookup_failed(channel, e));
    }
  };

  if state.exists {
    progress!("   {} has {}", channel.label(), state.remote_version);
  } else {
    progress!("   Not published on {}", channel.label());
  }
  info!(%channel, remote = %state.remote_version, exists = state.exists, "channel state");
  Ok(state)
}

fn finish(run: PipelineRun) -> PipelineRun {
  if let Outcome::Failed(ref e) = run.outcome {
    progress!("❌ {}", e);
  }
  run
}
