//! Bounded `AsyncRead` view over a streaming response body.
//!
//! reqwest hands the body out as a stream of arbitrarily sized [`Bytes`]
//! chunks. The copy loop wants fixed-size reads into its own buffer, so this
//! adapter keeps the unconsumed tail of the current chunk and serves it out
//! across as many reads as needed.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures_util::Stream;
use futures_util::stream::BoxStream;
use tokio::io::{AsyncRead, ReadBuf};

/// Response body adapted to [`AsyncRead`].
pub(crate) struct BodyReader {
    stream: BoxStream<'static, Result<Bytes, reqwest::Error>>,
    pending: Bytes,
}

impl BodyReader {
    pub(crate) fn new(response: reqwest::Response) -> Self {
        Self::from_stream(response.bytes_stream())
    }

    pub(crate) fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    {
        Self {
            stream: Box::pin(stream),
            pending: Bytes::new(),
        }
    }
}

impl AsyncRead for BodyReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        loop {
            if !self.pending.is_empty() {
                let n = self.pending.len().min(buf.remaining());
                let chunk = self.pending.split_to(n);
                buf.put_slice(&chunk);
                return Poll::Ready(Ok(()));
            }

            match ready!(self.stream.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => self.pending = chunk,
                Some(Err(e)) => return Poll::Ready(Err(io::Error::other(e))),
                None => return Poll::Ready(Ok(())),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    fn reader(chunks: Vec<&'static [u8]>) -> BodyReader {
        let items: Vec<Result<Bytes, reqwest::Error>> =
            chunks.into_iter().map(|c| Ok(Bytes::from_static(c))).collect();
        BodyReader::from_stream(futures_util::stream::iter(items))
    }

    #[tokio::test]
    async fn test_body_reader_splits_large_chunks_across_reads() {
        let mut body = reader(vec![b"abcdefgh"]);
        let mut buf = [0u8; 3];

        assert_eq!(body.read(&mut buf).await.unwrap(), 3);
        assert_eq!(&buf, b"abc");
        assert_eq!(body.read(&mut buf).await.unwrap(), 3);
        assert_eq!(&buf, b"def");
        assert_eq!(body.read(&mut buf).await.unwrap(), 2);
        assert_eq!(&buf[..2], b"gh");
        assert_eq!(body.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_body_reader_skips_empty_chunks() {
        let mut body = reader(vec![b"", b"xy", b"", b"z"]);
        let mut out = Vec::new();
        body.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"xyz");
    }

    #[tokio::test]
    async fn test_body_reader_empty_stream_is_eof() {
        let mut body = reader(vec![]);
        let mut buf = [0u8; 8];
        assert_eq!(body.read(&mut buf).await.unwrap(), 0);
    }
}
