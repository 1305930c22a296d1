//! Helpers shared by unit tests and the integration tests under `tests/`.

#[path = "../../tests/support/socket_guard.rs"]
pub mod socket_guard;
