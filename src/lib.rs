//! rget Core Library
//!
//! This library provides the download machinery behind the `rget` tool: one
//! resumable, optionally throttled HTTP download per task, with live speed and
//! ETA figures for a progress display.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`download`] - Download tasks, HTTP client, rate limiting, filename resolution
//! - [`parser`] - `#limit=` directives and URL validation
//! - [`format`] - Human-readable byte counts and durations

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod format;
pub mod parser;
#[cfg(test)]
pub(crate) mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use download::{DownloadError, DownloadTask, HttpClient, HttpSettings, RateLimiter};
pub use parser::{ParseError, parse_limit, validate_url};
