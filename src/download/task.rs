//! A single resumable, throttled download.
//!
//! [`DownloadTask`] is shared as `Arc<DownloadTask>` between three parties:
//!
//! - the driver ([`DownloadTask::start`]), which issues the request, decides
//!   whether to resume, runs the copy loop and records the outcome
//! - the sampler, a background task turning the byte counter into a
//!   bytes-per-second figure once per second
//! - any number of observers reading progress through the accessors
//!
//! Completion is broadcast once through a [`watch`] channel; observers either
//! poll [`DownloadTask::is_finished`] or await [`DownloadTask::wait`].
//!
//! # Example
//!
//! ```no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use rget_core::download::{DownloadTask, HttpClient};
//!
//! # async fn example() {
//! let task = Arc::new(DownloadTask::new(
//!     "https://example.com/big.iso#limit=500",
//!     HashMap::new(),
//!     HttpClient::new(),
//!     "./downloads",
//! ));
//! let driver = Arc::clone(&task);
//! tokio::spawn(async move { driver.start().await });
//!
//! task.wait().await;
//! match task.result() {
//!     Some(Ok(())) => println!("saved {} bytes", task.transferred_bytes()),
//!     Some(Err(e)) => eprintln!("failed: {e}"),
//!     None => unreachable!(),
//! }
//! # }
//! ```

mod copy;
mod sampler;

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::io::SeekFrom;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use self::copy::{CopyError, copy_throttled};
use super::body::BodyReader;
use super::client::{HttpClient, declared_content_length, supports_byte_ranges};
use super::constants::{CHUNK_SIZE, ETA_WIDTH, SAMPLE_INTERVAL};
use super::error::DownloadError;
use super::filename::resolve_filename;
use super::rate_limiter::RateLimiter;
use crate::format::{format_bytes, format_duration};
use crate::parser::parse_limit;

/// One download of one URL into one local file.
#[derive(Debug)]
pub struct DownloadTask {
    url: String,
    headers: HashMap<String, String>,
    client: HttpClient,
    output_dir: PathBuf,
    limiter: RateLimiter,
    sample_period: Duration,

    filename: OnceLock<PathBuf>,
    total_size: AtomicU64,
    /// Bytes accepted by the destination so far; only the driver writes it.
    transferred: AtomicU64,
    /// Last sampled bytes per second; only the sampler writes it.
    current_rate: Mutex<f64>,
    resuming: AtomicBool,
    started_at: OnceLock<Instant>,
    finished_at: OnceLock<Instant>,
    result: OnceLock<Result<(), DownloadError>>,
    completion: watch::Sender<bool>,
    launched: AtomicBool,
}

impl DownloadTask {
    /// Creates a task in its configured state. No I/O happens until
    /// [`start`](Self::start).
    ///
    /// A `#limit=N[k|m]` fragment directive in `raw_url` sets the byte-rate
    /// ceiling and is stripped from the URL that gets requested.
    #[must_use]
    pub fn new(
        raw_url: &str,
        headers: HashMap<String, String>,
        client: HttpClient,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        let (limit, url) = parse_limit(raw_url);
        let (completion, _) = watch::channel(false);
        Self {
            url,
            headers,
            client,
            output_dir: output_dir.into(),
            limiter: RateLimiter::new(limit),
            sample_period: SAMPLE_INTERVAL,
            filename: OnceLock::new(),
            total_size: AtomicU64::new(0),
            transferred: AtomicU64::new(0),
            current_rate: Mutex::new(0.0),
            resuming: AtomicBool::new(false),
            started_at: OnceLock::new(),
            finished_at: OnceLock::new(),
            result: OnceLock::new(),
            completion,
            launched: AtomicBool::new(false),
        }
    }

    /// Applies `bytes_per_sec` when the URL carried no limit directive.
    #[must_use]
    pub fn with_fallback_limit(mut self, bytes_per_sec: u64) -> Self {
        if self.limiter.is_disabled() {
            self.limiter = RateLimiter::new(bytes_per_sec);
        }
        self
    }

    /// Overrides how often the sampler recomputes the transfer rate.
    #[must_use]
    pub fn with_sample_period(mut self, period: Duration) -> Self {
        self.sample_period = period;
        self
    }

    /// Runs the task to completion.
    ///
    /// Never returns an error: the outcome is recorded in
    /// [`result`](Self::result) and announced through the completion signal,
    /// including when the driver panics. Only the first call does anything.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn start(self: &Arc<Self>) {
        if self.launched.swap(true, Ordering::AcqRel) {
            warn!("download task already started, ignoring");
            return;
        }
        self.run_guarded(self.drive()).await;
    }

    /// Runs `driver` behind a panic boundary, then finalizes with its outcome.
    async fn run_guarded<F>(&self, driver: F)
    where
        F: Future<Output = Result<(), DownloadError>>,
    {
        let outcome = AssertUnwindSafe(driver)
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(DownloadError::panicked(panic_message(&*payload))));
        self.finish(outcome);
    }

    async fn drive(self: &Arc<Self>) -> Result<(), DownloadError> {
        let response = self.client.fetch(&self.url, &self.headers, None).await?;

        let path = self.output_dir.join(resolve_filename(&response));
        let path = self.filename.get_or_init(|| path);
        debug!(path = %path.display(), "resolved destination");

        let (response, mut destination) = self.open_destination(response, path).await?;

        let declared = declared_content_length(response.headers());
        let total = match declared {
            Some(len) if self.is_resuming() => self.transferred.load(Ordering::Acquire) + len,
            other => other.unwrap_or(0),
        };
        self.total_size.store(total, Ordering::Release);

        let _sampler = sampler::spawn(Arc::clone(self), self.sample_period);
        let _ = self.started_at.set(Instant::now());

        let mut source = BodyReader::new(response);
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let copied = copy_throttled(
            &mut source,
            &mut destination,
            &mut buffer,
            &self.limiter,
            &self.transferred,
        )
        .await;

        match copied {
            Ok(()) => destination
                .flush()
                .await
                .map_err(|e| DownloadError::io(path, e)),
            Err(e) => {
                let flushed = destination.flush().await;
                debug!(ok = flushed.is_ok(), "flushed partial destination");
                Err(self.copy_failure(path, e))
            }
        }
    }

    /// Opens the destination file, resuming an existing partial file when the
    /// server honors a byte range.
    ///
    /// Returns the response whose body should be copied; on the resume path
    /// that is the ranged response, and the first one is dropped unread.
    async fn open_destination(
        &self,
        response: reqwest::Response,
        path: &Path,
    ) -> Result<(reqwest::Response, File), DownloadError> {
        let mut response = response;
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {
                let existing = meta.len();
                if declared_content_length(response.headers()) == Some(existing) {
                    return Err(DownloadError::already_complete(path, existing));
                }
                drop(response);

                debug!(existing, "partial file found, requesting remaining bytes");
                let ranged = self
                    .client
                    .fetch(&self.url, &self.headers, Some(existing))
                    .await?;

                if supports_byte_ranges(ranged.headers()) {
                    let mut file = OpenOptions::new()
                        .read(true)
                        .write(true)
                        .open(path)
                        .await
                        .map_err(|e| DownloadError::io(path, e))?;
                    file.seek(SeekFrom::End(0))
                        .await
                        .map_err(|e| DownloadError::io(path, e))?;
                    self.resuming.store(true, Ordering::Release);
                    self.transferred.store(existing, Ordering::Release);
                    debug!(existing, "resuming download");
                    return Ok((ranged, file));
                }

                warn!(
                    path = %path.display(),
                    existing,
                    "server ignored range request, discarding partial file"
                );
                response = ranged;
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(DownloadError::io(path, e)),
        }

        let file = File::create(path)
            .await
            .map_err(|e| DownloadError::io(path, e))?;
        Ok((response, file))
    }

    fn copy_failure(&self, path: &Path, error: CopyError) -> DownloadError {
        match error {
            CopyError::Read(e) => DownloadError::stream(&self.url, e),
            CopyError::Write(e) => DownloadError::io(path, e),
            CopyError::ShortWrite { written, expected } => {
                DownloadError::short_write(path, written, expected)
            }
        }
    }

    fn finish(&self, outcome: Result<(), DownloadError>) {
        match &outcome {
            Ok(()) => info!(
                bytes = self.transferred_bytes(),
                elapsed_ms = self.elapsed().as_millis(),
                resumed = self.is_resuming(),
                "download complete"
            ),
            Err(e) if e.is_already_complete() => info!(error = %e, "nothing to download"),
            Err(e) => warn!(
                error = %e,
                bytes = self.transferred_bytes(),
                "download failed"
            ),
        }

        let _ = self.result.set(outcome);
        let _ = self.finished_at.set(Instant::now());
        self.fire_completion();
    }

    /// Flips the completion signal. Returns false if it had already fired.
    fn fire_completion(&self) -> bool {
        self.completion.send_if_modified(|done| {
            if *done {
                false
            } else {
                *done = true;
                true
            }
        })
    }

    /// Request URL, without any limit directive.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Byte-rate ceiling in bytes per second (`0` when unthrottled).
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limiter.limit()
    }

    /// Destination path, once resolved from the first response.
    #[must_use]
    pub fn filename(&self) -> Option<&Path> {
        self.filename.get().map(PathBuf::as_path)
    }

    /// Expected final size in bytes, `0` if the server did not say.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.total_size.load(Ordering::Acquire)
    }

    /// Whether an existing partial file is being continued.
    #[must_use]
    pub fn is_resuming(&self) -> bool {
        self.resuming.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at.get().copied()
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at.get().copied()
    }

    /// Time spent transferring: up to now while running, frozen once finished.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        let Some(started) = self.started_at() else {
            return Duration::ZERO;
        };
        let end = self.finished_at().unwrap_or_else(Instant::now);
        end.saturating_duration_since(started)
    }

    /// Terminal outcome; `None` until the task has finished.
    #[must_use]
    pub fn result(&self) -> Option<&Result<(), DownloadError>> {
        self.result.get()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        *self.completion.borrow()
    }

    /// Receiver that observes `true` once the task has finished.
    #[must_use]
    pub fn completion(&self) -> watch::Receiver<bool> {
        self.completion.subscribe()
    }

    /// Resolves once the task has finished.
    pub async fn wait(&self) {
        let mut done = self.completion();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = done.wait_for(|finished| *finished).await;
    }

    /// Bytes written so far, including a resumed prefix.
    #[must_use]
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred.load(Ordering::Acquire)
    }

    /// [`transferred_bytes`](Self::transferred_bytes), or 0 without a task.
    #[must_use]
    pub fn transferred_or_zero(task: Option<&Self>) -> u64 {
        task.map_or(0, Self::transferred_bytes)
    }

    /// Last sampled transfer rate in bytes per second.
    #[must_use]
    pub fn current_rate(&self) -> f64 {
        *self
            .current_rate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Transfer rate for display, e.g. `1.5MB/s`.
    #[must_use]
    pub fn speed(&self) -> String {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rate = self.current_rate() as u64;
        format!("{}/s", format_bytes(rate))
    }

    /// Remaining time, always exactly six characters wide.
    ///
    /// Blank while the size or the rate is unknown.
    #[must_use]
    pub fn eta(&self) -> String {
        let total = self.total_size();
        let rate = self.current_rate();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let whole_rate = rate as u64;
        if total == 0 || whole_rate == 0 {
            return " ".repeat(ETA_WIDTH);
        }

        let seconds = total.saturating_sub(self.transferred_bytes()) / whole_rate;
        let mut eta = format!("{:>width$}", format_duration(seconds), width = ETA_WIDTH);
        eta.truncate(ETA_WIDTH);
        eta
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
