//! Resumable, throttled HTTP downloads.
//!
//! The centre of this module is [`DownloadTask`]: one URL streamed into one
//! local file, continuing a partial file when the server supports byte
//! ranges, optionally capped to a byte rate, with live speed and ETA figures
//! for a progress display.
//!
//! # Features
//!
//! - Streaming copy in 32 KiB chunks (memory use independent of file size)
//! - Resume from an existing partial file via `Range` requests
//! - Per-task byte-rate ceiling from a `#limit=` URL directive
//! - Filename derived from `Content-Disposition` or the URL path
//! - Environment-declared proxies (`HTTP_PROXY`, `HTTPS_PROXY`, `NO_PROXY`)
//! - Structured error types with full context
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
//!     "https://example.com/paper.pdf",
//!     HashMap::new(),
//!     HttpClient::new(),
//!     "./downloads",
//! ));
//! task.start().await;
//! if let Some(path) = task.filename() {
//!     println!("Downloaded: {}", path.display());
//! }
//! # }
//! ```

mod body;
mod client;
pub mod constants;
mod error;
mod filename;
pub mod rate_limiter;
mod task;

pub use client::{HttpClient, HttpSettings, declared_content_length, supports_byte_ranges};
pub use error::DownloadError;
pub use filename::resolve_filename;
pub use rate_limiter::RateLimiter;
pub use task::DownloadTask;

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
