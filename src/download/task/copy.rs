//! Rate-limited copy loop.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::download::rate_limiter::RateLimiter;

/// Why the copy loop stopped early.
///
/// Carries no URL or path; the driver adds that context when it maps this
/// into a `DownloadError`.
#[derive(Debug)]
pub(crate) enum CopyError {
    Read(io::Error),
    Write(io::Error),
    ShortWrite { written: usize, expected: usize },
}

/// Moves bytes from `source` to `destination` until end of stream.
///
/// Before each read the limiter is consulted with the running count.
/// A chunk is handed to a single write call and then flushed; `transferred`
/// is advanced only once both succeed. Buffered sinks such as
/// `tokio::fs::File` report a failed write on the following call, so without
/// the flush a lost chunk could already be counted. A short write stops the
/// loop without counting the chunk.
pub(crate) async fn copy_throttled<R, W>(
    source: &mut R,
    destination: &mut W,
    buffer: &mut [u8],
    limiter: &RateLimiter,
    transferred: &AtomicU64,
) -> Result<(), CopyError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    loop {
        if !limiter.is_disabled() {
            limiter.wait(transferred.load(Ordering::Acquire)).await;
        }

        let read = source.read(buffer).await.map_err(CopyError::Read)?;
        if read == 0 {
            return Ok(());
        }

        let written = destination
            .write(&buffer[..read])
            .await
            .map_err(CopyError::Write)?;
        if written < read {
            return Err(CopyError::ShortWrite {
                written,
                expected: read,
            });
        }
        destination.flush().await.map_err(CopyError::Write)?;

        let total = transferred.fetch_add(read as u64, Ordering::AcqRel) + read as u64;
        trace!(chunk = read, total, "chunk written");
    }
}
