use std::sync::Arc;

use tokio::net::TcpListener;

use postal_search::backend::{InMemoryBackend, SearchBackend};
use postal_search::config::Config;
use postal_search::failure::RecordFailures;
use postal_search::startup::build_app_with;
use postal_search::types::{Location, NewDocument};

/// Origin the test servers accept for cross-origin requests.
pub const TEST_ORIGIN: &str = "http://localhost:9000";

/// Version reported by the in-memory backend in API tests.
pub const TEST_VERSION: &str = "8.11.1";

pub struct TestServer {
    pub base_url: String,
    pub failures: Arc<RecordFailures>,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.server.cors_origin = TEST_ORIGIN.to_string();
    config.server.request_timeout_secs = 10;
    config.backend.create_index_on_startup = true;
    config
}

/// Start a server over `backend` with a recording failure policy.
pub async fn start_test_server_with(config: Config, backend: Arc<dyn SearchBackend>) -> TestServer {
    let failures = Arc::new(RecordFailures::new());
    let app = build_app_with(config, backend, failures.clone())
        .await
        .expect("failed to build app");

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer { base_url, failures }
}

/// Start a server over a fresh in-memory index.
pub async fn start_test_server() -> TestServer {
    let backend = Arc::new(InMemoryBackend::new("postal_codes").with_version(TEST_VERSION));
    start_test_server_with(test_config(), backend).await
}

pub fn colonia(name: &str, cp: &str) -> NewDocument {
    NewDocument {
        ciudad: "Ciudad de México".to_string(),
        colonia: name.to_string(),
        cp: cp.to_string(),
        delegacion: "Cuauhtémoc".to_string(),
        location: Location {
            lat: 19.4194,
            lon: -99.1617,
        },
    }
}

/// Create a document through the API and return its id.
pub async fn create_via_api(client: &reqwest::Client, base_url: &str, doc: &NewDocument) -> String {
    let resp = client
        .post(format!("{base_url}/search"))
        .json(doc)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}
