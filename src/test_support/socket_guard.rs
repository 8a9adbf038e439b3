//! Gate for tests that need a loopback listener.
//!
//! Sandboxed CI runners sometimes forbid binding sockets. Such tests skip with
//! a note on stderr unless `RGET_REQUIRE_SOCKET_TESTS` is truthy, in which case
//! the missing loopback is a hard failure. Integration tests include this file
//! through `#[path]`.

use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

const REQUIRE_ENV: &str = "RGET_REQUIRE_SOCKET_TESTS";

fn truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Whether a loopback listener can be bound here.
///
/// # Panics
///
/// When the bind fails and socket tests are required.
#[track_caller]
pub(crate) fn localhost_available() -> bool {
    let bind_error = match TcpListener::bind("127.0.0.1:0") {
        Ok(_) => return true,
        Err(e) => e,
    };

    let caller = Location::caller();
    let required = std::env::var(REQUIRE_ENV).is_ok_and(|v| truthy(&v));
    assert!(
        !required,
        "{caller}: loopback bind failed ({bind_error}) and {REQUIRE_ENV} is set"
    );
    eprintln!(
        "{caller}: skipped, loopback bind failed ({bind_error}); \
         set {REQUIRE_ENV}=1 to make this an error"
    );
    false
}

/// A running wiremock server, or `None` when the test should be skipped.
#[track_caller]
pub(crate) fn start_mock_server_or_skip() -> impl Future<Output = Option<MockServer>> {
    let available = localhost_available();
    async move {
        if available {
            Some(MockServer::start().await)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::truthy;

    #[test]
    fn test_truthy_values() {
        for value in ["1", "true", "YES", " on "] {
            assert!(truthy(value), "{value:?}");
        }
        for value in ["", "0", "false", "no", "maybe"] {
            assert!(!truthy(value), "{value:?}");
        }
    }
}
