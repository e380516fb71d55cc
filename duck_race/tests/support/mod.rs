// In-process race server for integration tests.
use duck_race::frameworks::config;
use duck_race::interface_adapters::state::AppState;
use duck_race::use_cases::{RaceRegistry, RaceSettings};
use std::sync::Arc;

pub struct TestServer {
    pub base_url: String,
    // Same registry the routes use, for driving races from the test side.
    pub registry: Arc<RaceRegistry>,
}

impl TestServer {
    /// Boots a server on an ephemeral port inside the current test runtime.
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral test port");
        let addr = listener.local_addr().expect("get local addr");

        let registry = Arc::new(RaceRegistry::new(RaceSettings {
            input_channel_capacity: config::INPUT_CHANNEL_CAPACITY,
            frame_broadcast_capacity: config::FRAME_BROADCAST_CAPACITY,
            tick_interval: config::TICK_INTERVAL,
            finished_linger: config::FINISHED_RACE_LINGER,
        }));
        let state = Arc::new(AppState {
            race_registry: Arc::clone(&registry),
            seed_override: None,
        });

        // The listener is already bound, so connections queue until the server accepts.
        tokio::spawn(async move {
            duck_race::serve(listener, state).await.expect("server failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            registry,
        }
    }

    pub async fn create_race(&self, payload: serde_json::Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/races", self.base_url))
            .json(&payload)
            .send()
            .await
            .expect("request should succeed")
    }

    pub fn ws_url(&self, race_id: &str) -> String {
        format!("{}/ws?race_id={race_id}", self.base_url.replacen("http://", "ws://", 1))
    }
}
