mod core;
mod oracle;
mod orchestrator;
mod pipeline;
mod project;
mod recipe;
#[cfg(test)]
mod testing;

use clap::Parser;
use core::config::DeployConfig;
use core::context::ProjectContext;
use core::error::{DeployError, DeployResult, print_error};
use core::exec::Toolchain;
use oracle::HttpFetcher;
use orchestrator::{Collaborators, DeployOptions};
use pipeline::{AutoConfirm, Confirm, StdinConfirm, UploadCredentials};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Log filter variable (e.g. `AUR_DEPLOY_LOG=aur_deploy=debug`)
const LOG_ENV: &str = "AUR_DEPLOY_LOG";

/// Publish a Python project to PyPI and update its AUR package
#[derive(Parser)]
#[command(name = "aur-deploy")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  /// Publish even if the remote version is equal or newer; skips confirmation
  #[arg(short, long)]
  force: bool,

  /// Project directory (a file path means its parent directory)
  #[arg(short, long, value_name = "PATH")]
  directory: Option<PathBuf>,

  /// Stop after publishing to PyPI
  #[arg(long)]
  no_aur: bool,

  /// Extra runtime dependencies for a newly created PKGBUILD
  #[arg(long = "aur-depends", value_name = "NAME", num_args = 1..)]
  aur_depends: Vec<String>,

  /// Answer yes to every confirmation prompt
  #[arg(short, long)]
  yes: bool,

  /// Print a JSON report of the run to stdout (progress moves to stderr)
  #[arg(long)]
  json: bool,

  /// Debug logging on stderr (overridden by AUR_DEPLOY_LOG)
  #[arg(short, long)]
  verbose: bool,
}

/// Get clap styling
fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn init_logging(verbose: bool) {
  let fallback = if verbose { "aur_deploy=debug" } else { "warn" };
  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .try_init()
    .ok();
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);
  core::progress::route_to_stderr(cli.json);

  match run(cli) {
    Ok(code) => std::process::exit(code),
    Err(err) => handle_error(err),
  }
}

fn run(cli: Cli) -> DeployResult<i32> {
  let root = ProjectContext::resolve_directory(cli.directory.as_deref())?;
  let config = DeployConfig::load(&root)?;
  let tools = Toolchain::system(&config.tools);
  let fetcher = HttpFetcher::new()?;
  let credentials = UploadCredentials::discover();
  let confirm: Box<dyn Confirm> = if cli.yes {
    Box::new(AutoConfirm)
  } else {
    Box::new(StdinConfirm)
  };

  let options = DeployOptions {
    force: cli.force,
    skip_repository: cli.no_aur,
    extra_dependencies: cli.aur_depends.into_iter().collect(),
  };
  let collaborators = Collaborators {
    tools: &tools,
    fetcher: &fetcher,
    confirm: confirm.as_ref(),
    credentials: credentials.as_ref(),
  };

  let summary = orchestrator::deploy(&root, config, &options, &collaborators)?;
  if cli.json {
    println!("{}", serde_json::to_string_pretty(&summary.report())?);
  } else {
    summary.print();
  }

  Ok(summary.exit_code())
}

fn handle_error(err: DeployError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
