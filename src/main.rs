use clap::{Parser, Subcommand};
use release_train::commands::next_version::{self, NextVersionOptions};
use release_train::commands::release::{self, ReleaseOptions};
use release_train::commands::tag::{self, TagOptions};
use release_train::core::error::print_error;

/// Automated semantic-version releases driven by conventional commits
#[derive(Parser)]
#[command(name = "release-train")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Calculate the next semantic version from commit history
  NextVersion {
    /// Path to the configuration file (default: release-train.yaml at the repo root)
    #[arg(short, long)]
    config: Option<String>,
    /// Show the commits analysed and how each type maps to a bump
    #[arg(short, long)]
    verbose: bool,
  },
  /// Create or refresh the release branch and its pull/merge request
  Release {
    /// Path to the configuration file (default: release-train.yaml at the repo root)
    #[arg(short, long)]
    config: Option<String>,
    /// Show the plan without mutating anything
    #[arg(long)]
    dry_run: bool,
    /// Show detailed progress output
    #[arg(short, long)]
    verbose: bool,
    /// Hosting provider override: github, azure, or gitlab (default: detect from origin URL)
    #[arg(long)]
    git_host: Option<String>,
  },
  /// Tag a merged release and publish it where the provider supports it
  TagRelease {
    /// Path to the configuration file (default: release-train.yaml at the repo root)
    #[arg(short, long)]
    config: Option<String>,
    /// Show what would be tagged without creating anything
    #[arg(long)]
    dry_run: bool,
    /// Show detailed progress output
    #[arg(short, long)]
    verbose: bool,
  },
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

  let result = match cli.command {
    Commands::NextVersion { config, verbose } => next_version::run(&NextVersionOptions {
      config_path: config,
      verbose,
    }),
    Commands::Release {
      config,
      dry_run,
      verbose,
      git_host,
    } => release::run(&ReleaseOptions {
      config_path: config,
      dry_run,
      verbose,
      git_host,
    }),
    Commands::TagRelease {
      config,
      dry_run,
      verbose,
    } => tag::run(&TagOptions {
      config_path: config,
      dry_run,
      verbose,
    }),
  };

  if let Err(err) = result {
    print_error(&err);
    std::process::exit(err.exit_code().as_i32());
  }
}
