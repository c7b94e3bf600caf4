//! Configuration loading and CLI merging.
//!
//! Precedence: explicit command-line flags, then the TOML config file, then
//! built-in defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use catalog_dl_core::ItemKind;
use catalog_dl_core::fetch::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use serde::Deserialize;

use crate::cli::{Cli, Command};

pub(crate) const DEFAULT_ORIGIN: &str = "https://onepiece-tube.com";
pub(crate) const DEFAULT_DELAY_MINUTES: u64 = 5;
pub(crate) const DEFAULT_LONG_DELAY_MINUTES: u64 = 360;
pub(crate) const DEFAULT_DAILY_LIMIT: u32 = 10;
pub(crate) const DEFAULT_UPDATE_HOUR: u8 = 3;
pub(crate) const DEFAULT_UPDATE_WEEKDAY: u8 = 0;

/// TOML-backed defaults. Every key is optional; unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub(crate) delay: Option<u64>,
    pub(crate) long_delay: Option<u64>,
    pub(crate) limit: Option<u32>,
    pub(crate) dst: Option<PathBuf>,
    pub(crate) update_hour: Option<u8>,
    pub(crate) update_on_day: Option<u8>,
    pub(crate) origin: Option<String>,
    pub(crate) verbosity: Option<VerbositySetting>,
    pub(crate) connect_timeout_secs: Option<u64>,
    pub(crate) read_timeout_secs: Option<u64>,
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl FileConfig {
    /// Validates values against the same ranges the CLI enforces.
    pub(crate) fn validate(&self) -> Result<()> {
        validate_range("delay", self.delay, 0, 1440)?;
        validate_range("long_delay", self.long_delay, 0, 10080)?;
        validate_range("limit", self.limit.map(u64::from), 1, 10000)?;
        validate_range("update_hour", self.update_hour.map(u64::from), 0, 23)?;
        validate_range("update_on_day", self.update_on_day.map(u64::from), 0, 6)?;
        validate_range("connect_timeout_secs", self.connect_timeout_secs, 1, 3600)?;
        validate_range("read_timeout_secs", self.read_timeout_secs, 1, 86400)?;
        if let Some(origin) = &self.origin
            && !(origin.starts_with("http://") || origin.starts_with("https://"))
        {
            bail!("Invalid config value for `origin`: '{origin}'. Expected an http(s) URL");
        }
        Ok(())
    }
}

fn validate_range(field: &str, value: Option<u64>, min: u64, max: u64) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(min..=max).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: {min}..={max}");
    }
    Ok(())
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/catalog-dl/config.toml`
/// 2. `$HOME/.config/catalog-dl/config.toml`
#[must_use]
pub(crate) fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("catalog-dl")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("catalog-dl")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the file config.
///
/// An explicit `--config` path must exist; the default path is optional.
pub(crate) fn load_file_config(explicit: Option<&Path>) -> Result<Option<FileConfig>> {
    if let Some(path) = explicit {
        return read_file_config(path).map(Some);
    }
    match resolve_default_config_path() {
        Some(path) if path.exists() => read_file_config(&path).map(Some),
        _ => Ok(None),
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

pub(crate) fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let config: FileConfig = toml::from_str(raw)?;
    config.validate()?;
    Ok(config)
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) kind: ItemKind,
    pub(crate) delay: Duration,
    pub(crate) long_delay: Duration,
    pub(crate) daily_limit: u32,
    pub(crate) dest_root: PathBuf,
    pub(crate) update_hour: u8,
    pub(crate) update_weekday: u8,
    pub(crate) origin: String,
    pub(crate) connect_timeout_secs: u64,
    pub(crate) read_timeout_secs: u64,
    pub(crate) once: bool,
    pub(crate) log_level: &'static str,
}

/// Merges CLI flags over file values over defaults.
pub(crate) fn resolve_settings(cli: &Cli, file: Option<&FileConfig>) -> Result<Settings> {
    let file = file.cloned().unwrap_or_default();
    let args = cli.command.run_args();
    let kind = match cli.command {
        Command::Anime(_) => ItemKind::Episode,
        Command::Manga(_) => ItemKind::Chapter,
    };

    let delay = args.delay.or(file.delay).unwrap_or(DEFAULT_DELAY_MINUTES);
    let long_delay = args
        .long_delay
        .or(file.long_delay)
        .unwrap_or(DEFAULT_LONG_DELAY_MINUTES);
    let daily_limit = args.limit.or(file.limit).unwrap_or(DEFAULT_DAILY_LIMIT);
    if daily_limit == 0 {
        bail!("Invalid effective limit value: 0. Expected range: 1..=10000");
    }

    Ok(Settings {
        kind,
        delay: minutes(delay),
        long_delay: minutes(long_delay),
        daily_limit,
        dest_root: args
            .dst
            .clone()
            .or(file.dst)
            .unwrap_or_else(|| PathBuf::from(".")),
        update_hour: args
            .update_hour
            .or(file.update_hour)
            .unwrap_or(DEFAULT_UPDATE_HOUR),
        update_weekday: args
            .update_on_day
            .or(file.update_on_day)
            .unwrap_or(DEFAULT_UPDATE_WEEKDAY),
        origin: args
            .origin
            .clone()
            .or(file.origin)
            .unwrap_or_else(|| DEFAULT_ORIGIN.to_string()),
        connect_timeout_secs: file.connect_timeout_secs.unwrap_or(CONNECT_TIMEOUT_SECS),
        read_timeout_secs: file.read_timeout_secs.unwrap_or(READ_TIMEOUT_SECS),
        once: args.once,
        log_level: resolve_log_level(cli, file.verbosity),
    })
}

fn minutes(value: u64) -> Duration {
    Duration::from_secs(value.saturating_mul(60))
}

/// Default log level when `RUST_LOG` is unset.
///
/// Command-line verbosity flags win over the file's `verbosity` key.
pub(crate) fn resolve_log_level(cli: &Cli, file: Option<VerbositySetting>) -> &'static str {
    let cli_set = cli.quiet || cli.debug || cli.verbose > 0;
    if !cli_set && let Some(setting) = file {
        return match setting {
            VerbositySetting::Default => "info",
            VerbositySetting::Verbose | VerbositySetting::Debug => "debug",
            VerbositySetting::Quiet => "error",
        };
    }
    if cli.quiet {
        "error"
    } else if cli.verbose >= 2 {
        "trace"
    } else if cli.verbose == 1 || cli.debug {
        "debug"
    } else {
        "info"
    }
}
