//! CLI entry point for the rget tool.

use std::collections::HashMap;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rget_core::download::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use rget_core::{DownloadTask, HttpClient, HttpSettings, parse_limit, validate_url};
use tracing::{debug, error, info, warn};

mod app_config;
mod cli;
mod progress;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let loaded = app_config::load_default_file_config()?;
    if let (Some(path), Some(_)) = (&loaded.path, &loaded.config) {
        debug!(path = %path.display(), "loaded config file");
    }
    let file_config = loaded.config.unwrap_or_default();

    if args.urls.is_empty() {
        info!("No URLs given.");
        info!("Example: rget 'https://example.com/file.iso#limit=500'");
        return Ok(());
    }

    let settings = HttpSettings {
        connect_timeout: Duration::from_secs(
            args.connect_timeout
                .or(file_config.connect_timeout_secs)
                .unwrap_or(CONNECT_TIMEOUT_SECS),
        ),
        read_timeout: Duration::from_secs(
            args.read_timeout
                .or(file_config.read_timeout_secs)
                .unwrap_or(READ_TIMEOUT_SECS),
        ),
    };
    let client = HttpClient::with_settings(settings).context("Failed to build HTTP client")?;

    let output_dir = args
        .output_dir
        .or(file_config.output_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    tokio::fs::create_dir_all(&output_dir)
        .await
        .with_context(|| format!("Failed to create output directory '{}'", output_dir.display()))?;

    let fallback_limit = args
        .limit
        .or(file_config.limit)
        .unwrap_or(0)
        .saturating_mul(1000);
    let headers: HashMap<String, String> = args.headers.into_iter().collect();

    let mut failed = 0usize;
    let mut tasks = Vec::with_capacity(args.urls.len());
    for raw_url in &args.urls {
        let (_, clean_url) = parse_limit(raw_url);
        if let Err(e) = validate_url(&clean_url) {
            error!(error = %e, "Skipping invalid URL");
            failed += 1;
            continue;
        }
        let task = DownloadTask::new(raw_url, headers.clone(), client.clone(), output_dir.clone())
            .with_fallback_limit(fallback_limit);
        debug!(url = task.url(), limit_bps = task.limit(), "Created download task");
        tasks.push(Arc::new(task));
    }

    let drivers: Vec<_> = tasks
        .iter()
        .map(|task| {
            let task = Arc::clone(task);
            tokio::spawn(async move { task.start().await })
        })
        .collect();

    let show_progress = !args.no_progress && !args.quiet && std::io::stderr().is_terminal();
    let progress_ui = progress::spawn_progress_ui(show_progress, tasks.clone());

    for driver in drivers {
        driver.await.context("Download task was aborted")?;
    }
    if let Some(handle) = progress_ui {
        handle.await.context("Progress display failed")?;
    }

    for task in &tasks {
        let line = progress::summary_line(task);
        match task.result() {
            Some(Err(e)) if !e.is_already_complete() => {
                failed += 1;
                warn!("{line}");
            }
            _ => info!("{line}"),
        }
    }

    let total = args.urls.len();
    if failed > 0 {
        bail!("{failed} of {total} downloads failed");
    }
    info!(total, "All downloads finished");
    Ok(())
}
