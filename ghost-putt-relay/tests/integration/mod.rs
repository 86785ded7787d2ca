//! Integration tests for ghost-putt-relay, driven through the WebSocket
//! client from ghost-putt-session.

mod test_release_on_disconnect;

use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}
