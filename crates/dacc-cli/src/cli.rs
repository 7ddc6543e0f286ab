use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use clap_complete::Shell;
use dacc_core::DailyArtifact;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dacc", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level (overridden by RUST_LOG)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    /// Configuration file (defaults to ~/.dacc/config.toml)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the hourly partition of a business day
    Hours {
        /// Local business date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Business timezone (defaults to the configured one)
        #[arg(long)]
        timezone: Option<String>,
        /// Version used in the hourly file names
        #[arg(long)]
        version: Option<u32>,
    },
    /// Build canonical output names
    Name {
        #[command(subcommand)]
        command: NameCommands,
    },
    /// Run one business day offline against scripted engine outcomes
    Run {
        /// Daily request (business day, version, per-hour inputs)
        #[arg(long, value_hint = ValueHint::FilePath)]
        request: PathBuf,
        /// Native constraint records
        #[arg(long, value_hint = ValueHint::FilePath)]
        constraints: PathBuf,
        /// Scripted engine outcome per hour position
        #[arg(long, value_hint = ValueHint::FilePath)]
        outcomes: PathBuf,
        /// Output directory (defaults to the configured output root)
        #[arg(long, value_hint = ValueHint::DirPath)]
        out: Option<PathBuf>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum NameCommands {
    /// Hourly result file name for the hour starting at an instant
    Hourly {
        /// Hour start, e.g. 2019-01-08T09:00Z
        #[arg(long)]
        instant: String,
        #[arg(long)]
        version: Option<u32>,
        #[arg(long)]
        timezone: Option<String>,
    },
    /// Daily artifact file name for a business date
    Daily {
        /// Local business date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        version: Option<u32>,
        #[arg(long, value_enum, default_value_t = ArtifactArg::Document)]
        artifact: ArtifactArg,
        #[arg(long)]
        timezone: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactArg {
    Document,
    Manifest,
    Log,
}

impl From<ArtifactArg> for DailyArtifact {
    fn from(value: ArtifactArg) -> Self {
        match value {
            ArtifactArg::Document => DailyArtifact::Document,
            ArtifactArg::Manifest => DailyArtifact::Manifest,
            ArtifactArg::Log => DailyArtifact::Log,
        }
    }
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
