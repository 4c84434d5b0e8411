//! Minimal Elasticsearch stand-in that records every request it receives.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Version reported by the mock's root endpoint.
pub const MOCK_VERSION: &str = "7.17.9";

/// Index name for which every request fails with a 500.
pub const BROKEN_INDEX: &str = "broken";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct MockState {
    index_exists: bool,
    documents: BTreeMap<String, Value>,
    requests: Vec<RecordedRequest>,
}

#[derive(Clone, Default)]
pub struct MockElastic {
    state: Arc<Mutex<MockState>>,
}

impl MockElastic {
    /// Start the mock on an ephemeral port and return it with its base URL.
    pub async fn start() -> (Self, String) {
        let mock = MockElastic::default();
        let app = axum::Router::new()
            .fallback(handle)
            .with_state(mock.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (mock, format!("http://{addr}"))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Requests whose method matches, in arrival order.
    pub fn requests_with(&self, method: Method) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    pub fn clear_requests(&self) {
        self.state.lock().unwrap().requests.clear();
    }
}

async fn handle(
    State(mock): State<MockElastic>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body: Option<Value> = serde_json::from_slice(&body).ok();
    let mut state = mock.state.lock().unwrap();
    state.requests.push(RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(String::from),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body: body.clone(),
    });

    let segments: Vec<&str> = uri.path().trim_matches('/').split('/').collect();
    if segments.first() == Some(&BROKEN_INDEX) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": { "type": "search_phase_execution_exception", "reason": "all shards failed" },
                "status": 500
            })),
        )
            .into_response();
    }

    match (method.as_str(), segments.as_slice()) {
        ("GET", [""]) => Json(json!({
            "name": "mock",
            "version": { "number": MOCK_VERSION },
            "tagline": "You Know, for Search"
        }))
        .into_response(),

        ("HEAD", [_index]) => {
            if state.index_exists {
                StatusCode::OK.into_response()
            } else {
                StatusCode::NOT_FOUND.into_response()
            }
        }

        ("PUT", [_index]) => {
            state.index_exists = true;
            Json(json!({ "acknowledged": true })).into_response()
        }

        ("PUT", [_index, "_doc", id]) => {
            let created = !state.documents.contains_key(*id);
            state
                .documents
                .insert(id.to_string(), body.unwrap_or(Value::Null));
            let status = if created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(json!({ "_id": id, "result": "created" }))).into_response()
        }

        ("GET", [_index, "_doc", id]) => match state.documents.get(*id) {
            Some(source) => Json(json!({ "_id": id, "found": true, "_source": source }))
                .into_response(),
            None => (
                StatusCode::NOT_FOUND,
                Json(json!({ "_id": id, "found": false })),
            )
                .into_response(),
        },

        ("POST", [_index, "_update", id]) => match state.documents.get_mut(*id) {
            Some(stored) => {
                if let (Some(target), Some(patch)) = (
                    stored.as_object_mut(),
                    body.as_ref().and_then(|b| b["doc"].as_object()),
                ) {
                    for (k, v) in patch {
                        target.insert(k.clone(), v.clone());
                    }
                }
                Json(json!({ "_id": id, "result": "updated" })).into_response()
            }
            None => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": { "type": "document_missing_exception", "reason": format!("[{id}]: document missing") },
                    "status": 404
                })),
            )
                .into_response(),
        },

        ("DELETE", [_index, "_doc", id]) => match state.documents.remove(*id) {
            Some(_) => Json(json!({ "_id": id, "result": "deleted" })).into_response(),
            None => (
                StatusCode::NOT_FOUND,
                Json(json!({ "_id": id, "result": "not_found" })),
            )
                .into_response(),
        },

        ("POST", [_index, "_search"]) => {
            let size = body
                .as_ref()
                .and_then(|b| b["size"].as_u64())
                .unwrap_or(10) as usize;
            let mut hits: Vec<(&String, &Value)> = state.documents.iter().collect();
            hits.sort_by(|a, b| {
                a.1["colonia"]
                    .as_str()
                    .unwrap_or("")
                    .cmp(b.1["colonia"].as_str().unwrap_or(""))
            });
            let hits: Vec<Value> = hits
                .into_iter()
                .take(size)
                .map(|(id, source)| json!({ "_id": id, "_score": null, "_source": source }))
                .collect();
            Json(json!({
                "took": 1,
                "hits": { "total": { "value": hits.len(), "relation": "eq" }, "hits": hits }
            }))
            .into_response()
        }

        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": { "type": "unsupported", "reason": uri.path() } })),
        )
            .into_response(),
    }
}
