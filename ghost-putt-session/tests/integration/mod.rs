//! Integration tests for ghost-putt-session.
//!
//! Tests are organized by functionality:
//! - `connection_tests` - hosting, joining and handshake failures
//! - `messaging_tests` - game messages over data links
//! - `multi_peer_tests` - several joiners in one room
//! - `failure_tests` - link failures and teardown

pub mod connection_tests;
pub mod failure_tests;
pub mod messaging_tests;
pub mod multi_peer_tests;

use tracing::Level;

/// Initialize tracing for tests (call once per test).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}
