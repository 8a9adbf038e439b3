//! Loopback HTTP server that writes hand-built responses.
//!
//! wiremock always frames bodies correctly. This server writes exactly the
//! bytes a handler returns and then closes the connection, so tests can send
//! truncated bodies or omit `Content-Length`.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::socket_guard::localhost_available;

type Handler = dyn Fn(&str) -> Vec<u8> + Send + Sync;

pub struct RawServer {
    addr: std::net::SocketAddr,
    accept_loop: JoinHandle<()>,
}

impl RawServer {
    /// Starts serving, or returns `None` when loopback sockets are unavailable.
    ///
    /// `handler` receives the request head (request line and headers,
    /// lowercased) and returns the complete response bytes.
    #[track_caller]
    pub fn start<F>(handler: F) -> impl Future<Output = Option<Self>>
    where
        F: Fn(&str) -> Vec<u8> + Send + Sync + 'static,
    {
        let available = localhost_available();
        let handler: Arc<Handler> = Arc::new(handler);
        async move {
            if !available {
                return None;
            }
            let listener = TcpListener::bind("127.0.0.1:0").await.ok()?;
            let addr = listener.local_addr().ok()?;
            let accept_loop = tokio::spawn(async move {
                while let Ok((mut stream, _)) = listener.accept().await {
                    let handler = Arc::clone(&handler);
                    tokio::spawn(async move {
                        let Some(head) = read_head(&mut stream).await else {
                            return;
                        };
                        let reply = handler(&head);
                        let _ = stream.write_all(&reply).await;
                        let _ = stream.shutdown().await;
                    });
                }
            });
            Some(Self { addr, accept_loop })
        }
    }

    pub fn url(&self, route: &str) -> String {
        format!("http://{}{route}", self.addr)
    }
}

impl Drop for RawServer {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

async fn read_head(stream: &mut tokio::net::TcpStream) -> Option<String> {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        head.extend_from_slice(&chunk[..n]);
    }
    Some(String::from_utf8_lossy(&head).to_ascii_lowercase())
}

/// Status line and headers followed by `body`.
pub fn response(status_line: &str, headers: &[(&str, String)], body: &[u8]) -> Vec<u8> {
    let mut out = format!("HTTP/1.1 {status_line}\r\n");
    for (name, value) in headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str("\r\n");
    let mut out = out.into_bytes();
    out.extend_from_slice(body);
    out
}
