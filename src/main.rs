mod commands;
mod core;
mod release;
mod services;
mod ui;
mod utils;

use clap::{CommandFactory, Parser};
use commands::ReleaseArgs;
use core::error::{ReleaseError, print_error};
use std::path::PathBuf;

/// Cut a release: bump versions, tag, build and publish the distribution
#[derive(Parser)]
#[command(name = "release-train")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  /// Version to release, MAJOR.MINOR.MICRO.QUALIFIER (e.g. 4.1.1.BETA1)
  #[arg(value_name = "VERSION")]
  release: Option<String>,

  /// Branch to release from (default: main_branch from the settings)
  branch: Option<String>,

  /// Settings file to use instead of searching for release.toml
  #[arg(long, value_name = "PATH")]
  settings: Option<PathBuf>,

  /// Debug logging
  #[arg(short, long)]
  verbose: bool,
}

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

fn main() {
  let cli = Cli::parse();

  let Some(version) = cli.release else {
    print_usage();
    return;
  };

  let args = ReleaseArgs {
    version,
    branch: cli.branch,
    settings: cli.settings,
    verbose: cli.verbose,
  };

  if let Err(err) = commands::run_release(args) {
    handle_error(err);
  }
}

fn print_usage() {
  let mut cmd = Cli::command();
  if cmd.print_help().is_err() {
    eprintln!("{}", cmd.render_usage());
  }
}

fn handle_error(err: ReleaseError) -> ! {
  print_error(&err);
  if matches!(err, ReleaseError::InvalidVersion { .. }) {
    eprintln!("{}", Cli::command().render_usage());
  }
  std::process::exit(err.exit_code().as_i32());
}
