//! Mock archive startup for tests that need a localhost socket.
//!
//! Some sandboxed runners forbid binding sockets. Such tests are skipped with
//! a note on stderr, unless `WADO_REQUIRE_SOCKET_TESTS` asks for a hard
//! failure.

use std::net::TcpListener;

use wiremock::MockServer;

const REQUIRE_SOCKET_TESTS_ENV: &str = "WADO_REQUIRE_SOCKET_TESTS";

fn socket_tests_required() -> bool {
    std::env::var(REQUIRE_SOCKET_TESTS_ENV).is_ok_and(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        )
    })
}

/// Starts a wiremock archive, or returns `None` when localhost cannot be
/// bound.
///
/// # Panics
///
/// Panics instead of returning `None` when `WADO_REQUIRE_SOCKET_TESTS` is set.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if let Err(error) = TcpListener::bind("127.0.0.1:0") {
        assert!(
            !socket_tests_required(),
            "cannot bind a localhost socket for the mock archive ({error}) \
             and {REQUIRE_SOCKET_TESTS_ENV} is set"
        );
        eprintln!(
            "[mock-archive] cannot bind a localhost socket ({error}); skipping. \
             Set {REQUIRE_SOCKET_TESTS_ENV}=1 to fail instead."
        );
        return None;
    }
    Some(MockServer::start().await)
}
