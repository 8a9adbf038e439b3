//! Constants for the download module (chunking, sampling, timeouts).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes between body reads).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Upper bound on a single copy-loop read (32 KiB).
pub const CHUNK_SIZE: usize = 32 * 1024;

/// Window over which the sampler measures throughput.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Fixed display width of the ETA column.
pub const ETA_WIDTH: usize = 6;
