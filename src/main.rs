//! CLI entry point for the catalog downloader.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use catalog_dl_core::{
    CatalogSource, DownloadScheduler, HttpClient, ImageMagick, ItemKind, LinkResolver,
    MediaWriter, SchedulerConfig, TokioPacer, UpdateClock, weekday_from_index,
};
use clap::Parser;
use tracing::{debug, error, info};

mod cli;
mod config;

use cli::Cli;
use config::Settings;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();
    let file_config = config::load_file_config(cli.config.as_deref())?;
    let settings = config::resolve_settings(&cli, file_config.as_ref())?;

    // Priority: RUST_LOG env var > CLI verbosity flags > config file > info
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(settings.log_level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    debug!(?cli, "CLI arguments parsed");
    debug!(?settings, "settings resolved");

    let converter = Arc::new(ImageMagick::new());
    if settings.kind == ItemKind::Chapter
        && let Err(e) = converter.check_available().await
    {
        error!(error = %e, "ImageMagick is required for chapter downloads");
        return Ok(ExitCode::from(1));
    }

    tokio::fs::create_dir_all(&settings.dest_root)
        .await
        .with_context(|| {
            format!(
                "Failed to create destination root '{}'",
                settings.dest_root.display()
            )
        })?;

    info!(
        kind = settings.kind.as_str(),
        root = %settings.dest_root.display(),
        "catalog-dl starting"
    );

    tokio::select! {
        result = run(&settings, converter) => result?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            info!("interrupted, shutting down");
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Refresh loop: fetch catalog, run one scheduler pass, sleep until the
/// next update hour. Returns only in `--once` mode.
async fn run(settings: &Settings, converter: Arc<ImageMagick>) -> Result<()> {
    let client = HttpClient::new_with_timeouts(
        settings.connect_timeout_secs,
        settings.read_timeout_secs,
    );
    let source = CatalogSource::new(&settings.origin, settings.kind);
    let scheduler = DownloadScheduler::new(
        SchedulerConfig {
            delay: settings.delay,
            long_delay: settings.long_delay,
            daily_limit: settings.daily_limit,
            dest_root: settings.dest_root.clone(),
        },
        LinkResolver::new(settings.kind),
        MediaWriter::new(converter),
        Arc::new(TokioPacer),
    );
    let clock = UpdateClock::new(
        u32::from(settings.update_hour),
        weekday_from_index(settings.update_weekday),
    );

    loop {
        info!(url = %source.listing_url(), "starting catalog fetch");
        match source.fetch_catalog(&client).await {
            Ok(catalog) => {
                let report = scheduler.run_cycle(&catalog, &client).await;
                if settings.once {
                    info!(
                        downloaded = report.downloaded(),
                        failed = report.failed(),
                        "single cycle finished"
                    );
                    return Ok(());
                }
            }
            Err(e) if settings.once => return Err(e).context("Catalog fetch failed"),
            Err(e) => error!(error = %e, "catalog fetch failed, waiting for next update"),
        }

        clock.wait().await;
    }
}
