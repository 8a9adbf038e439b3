//! Error types for the download module.
//!
//! Every way a download task can end unsuccessfully maps onto exactly one
//! variant here. Variants carry the URL or path they relate to so the message
//! is actionable without extra context.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that terminate a download task.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Request could not be sent or the connection failed before a response.
    #[error("transport error requesting {url}: {source}")]
    Transport {
        /// The URL being requested.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with something other than 200 or 206.
    #[error("unexpected HTTP {status} from {url}")]
    HttpStatus {
        /// The URL being requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The local file already holds as many bytes as the server reports.
    #[error("{path} is already downloaded ({size} bytes)")]
    AlreadyComplete {
        /// The destination that matched the remote size.
        path: PathBuf,
        /// Size of the local file in bytes.
        size: u64,
    },

    /// Stat, open, create, seek, write or flush failed on the destination.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The destination accepted fewer bytes than it was handed.
    #[error("short write to {path}: wrote {written} of {expected} bytes")]
    ShortWrite {
        /// The destination path.
        path: PathBuf,
        /// Bytes the write call reported.
        written: usize,
        /// Bytes that were read from the source.
        expected: usize,
    },

    /// Reading the response body failed before a clean end of stream.
    #[error("stream error reading {url}: {source}")]
    Stream {
        /// The URL whose body failed.
        url: String,
        /// The underlying read error.
        #[source]
        source: std::io::Error,
    },

    /// The task panicked; the panic was caught and converted.
    #[error("download task panicked: {message}")]
    Panicked {
        /// The panic payload rendered as text.
        message: String,
    },
}

impl DownloadError {
    /// Creates a transport error from a reqwest error.
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    /// Creates an unexpected-status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an already-complete error.
    pub fn already_complete(path: impl Into<PathBuf>, size: u64) -> Self {
        Self::AlreadyComplete {
            path: path.into(),
            size,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a short-write error.
    pub fn short_write(path: impl Into<PathBuf>, written: usize, expected: usize) -> Self {
        Self::ShortWrite {
            path: path.into(),
            written,
            expected,
        }
    }

    /// Creates a stream error.
    pub fn stream(url: impl Into<String>, source: std::io::Error) -> Self {
        Self::Stream {
            url: url.into(),
            source,
        }
    }

    /// Creates a recovered-panic error.
    pub fn panicked(message: impl Into<String>) -> Self {
        Self::Panicked {
            message: message.into(),
        }
    }

    /// Returns true when the task stopped because the file was already there.
    ///
    /// Orchestrators usually treat this as a benign outcome.
    #[must_use]
    pub fn is_already_complete(&self) -> bool {
        matches!(self, Self::AlreadyComplete { .. })
    }
}

// Like the rest of this module's callers, we do not implement `From<reqwest::Error>`
// or `From<std::io::Error>`: every variant needs a url or path the source error
// does not carry, so the helper constructors are the only way in.
