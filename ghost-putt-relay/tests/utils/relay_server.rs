use ghost_putt_relay::{RelayService, serve_listener};
use tokio::net::TcpListener;

/// A relay on an ephemeral local port.
pub struct TestRelay {
    pub url: String,
    pub service: RelayService,
}

impl TestRelay {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test relay");
        let addr = listener.local_addr().expect("No local address");
        let service = RelayService::new();

        let server = service.clone();
        tokio::spawn(async move {
            let _ = serve_listener(listener, server, "/ws").await;
        });

        Self {
            url: format!("ws://{addr}/ws"),
            service,
        }
    }

    /// Polls until `condition` holds on the relay's registry.
    pub async fn wait_until<F>(&self, condition: F, timeout_ms: u64) -> bool
    where
        F: Fn(&RelayService) -> bool,
    {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        while !condition(&self.service) {
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        true
    }
}
