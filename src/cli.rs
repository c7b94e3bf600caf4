//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Keep a local copy of a remote episode or chapter catalog up to date.
///
/// Every refresh fetches the catalog, downloads whatever is missing under the
/// destination root (pausing between downloads and backing off once the daily
/// limit is reached), then sleeps until the next update hour.
#[derive(Parser, Debug)]
#[command(name = "catalog-dl")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable debug logging (same as -v)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Read defaults from this TOML file instead of the user config file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Product variant to keep in sync.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download episodes as single video files
    Anime(RunArgs),
    /// Download chapters as page images bundled into a PDF
    Manga(RunArgs),
}

impl Command {
    /// Shared run flags.
    #[must_use]
    pub fn run_args(&self) -> &RunArgs {
        match self {
            Self::Anime(args) | Self::Manga(args) => args,
        }
    }
}

/// Flags shared by both variants. Unset flags fall back to the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Minutes to wait after each download (0-1440)
    #[arg(long, value_name = "MINUTES", value_parser = clap::value_parser!(u64).range(0..=1440))]
    pub delay: Option<u64>,

    /// Minutes to wait once the download limit is reached (0-10080)
    #[arg(long, value_name = "MINUTES", value_parser = clap::value_parser!(u64).range(0..=10080))]
    pub long_delay: Option<u64>,

    /// Downloads between long delays (1-10000)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=10000))]
    pub limit: Option<u32>,

    /// Destination root for downloads
    #[arg(long, value_name = "DIR")]
    pub dst: Option<PathBuf>,

    /// Hour (0-23) of the daily catalog refresh
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=23))]
    pub update_hour: Option<u8>,

    /// Weekday (0-6, Sunday = 0) reported as the update day
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=6))]
    pub update_on_day: Option<u8>,

    /// Site origin serving the catalog
    #[arg(long, value_name = "URL")]
    pub origin: Option<String>,

    /// Run a single refresh cycle and exit
    #[arg(long)]
    pub once: bool,
}
