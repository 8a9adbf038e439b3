//! Progress UI (one bar per download) and end-of-run summaries.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rget_core::DownloadTask;
use rget_core::format::{format_bytes, format_duration};

const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// Spawns the progress UI when requested.
///
/// The returned handle resolves once every task has finished and its bar has
/// been frozen.
pub(crate) fn spawn_progress_ui(
    enabled: bool,
    tasks: Vec<Arc<DownloadTask>>,
) -> Option<tokio::task::JoinHandle<()>> {
    if !enabled || tasks.is_empty() {
        return None;
    }
    Some(tokio::spawn(render_bars(tasks)))
}

async fn render_bars(tasks: Vec<Arc<DownloadTask>>) {
    let multi = MultiProgress::new();
    let style = ProgressStyle::with_template(
        "{msg:30!} [{bar:25.cyan/blue}] {bytes:>10}/{total_bytes:<10} {prefix}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=> ");

    let bars: Vec<ProgressBar> = tasks
        .iter()
        .map(|task| {
            let bar = multi.add(ProgressBar::new(0));
            bar.set_style(style.clone());
            bar.set_message(display_name(task));
            bar
        })
        .collect();

    let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
    loop {
        ticker.tick().await;

        let mut all_done = true;
        for (task, bar) in tasks.iter().zip(&bars) {
            if bar.is_finished() {
                continue;
            }
            bar.set_message(display_name(task));
            let total = task.total_size();
            if total > 0 {
                bar.set_length(total);
            }
            bar.set_position(task.transferred_bytes());
            bar.set_prefix(status_suffix(task));

            if task.is_finished() {
                bar.set_prefix(outcome_label(task));
                bar.abandon();
            } else {
                all_done = false;
            }
        }

        if all_done {
            break;
        }
    }
}

/// Live `speed eta` column.
fn status_suffix(task: &DownloadTask) -> String {
    format!("{:>10} {}", task.speed(), task.eta())
}

fn outcome_label(task: &DownloadTask) -> &'static str {
    match task.result() {
        Some(Ok(())) => "done",
        Some(Err(e)) if e.is_already_complete() => "complete",
        Some(Err(_)) => "failed",
        None => "",
    }
}

/// Destination file name once known, the URL before that.
pub(crate) fn display_name(task: &DownloadTask) -> String {
    task.filename()
        .and_then(Path::file_name)
        .map_or_else(|| task.url().to_string(), |name| name.to_string_lossy().into_owned())
}

/// One-line outcome of a finished task.
pub(crate) fn summary_line(task: &DownloadTask) -> String {
    let name = display_name(task);
    match task.result() {
        Some(Ok(())) => {
            let resumed = if task.is_resuming() { ", resumed" } else { "" };
            format!(
                "{name}: {} in {}{resumed}",
                format_bytes(task.transferred_bytes()),
                format_duration(task.elapsed().as_secs())
            )
        }
        Some(Err(e)) if e.is_already_complete() => format!("{name}: already complete"),
        Some(Err(e)) => format!("{name}: failed: {e}"),
        None => format!("{name}: not finished"),
    }
}
