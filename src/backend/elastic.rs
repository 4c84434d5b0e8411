use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::config::BackendConfig;
use crate::error::{PostalError, Result};
use crate::query::SearchRequest;
use crate::types::{Document, NewDocument};

use super::traits::{Hit, PingInfo, SearchBackend};

/// Elasticsearch REST client bound to one index.
///
/// Speaks the document APIs of Elasticsearch 7+ (`_doc`, `_update`) and, when
/// a legacy mapping type is configured, the typed paths of 5.x/6.x.
#[derive(Clone)]
pub struct ElasticBackend {
    client: reqwest::Client,
    entrypoint: Url,
    username: Option<String>,
    password: Option<String>,
    index: String,
    doc_type: Option<String>,
    refresh_on_write: bool,
}

#[derive(Deserialize)]
struct RootInfo {
    version: VersionInfo,
}

#[derive(Deserialize)]
struct VersionInfo {
    number: String,
}

#[derive(Deserialize)]
struct Acknowledged {
    #[serde(default)]
    acknowledged: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct GetResponse {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source")]
    source: Option<Value>,
}

impl ElasticBackend {
    /// Create a new backend from configuration.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let entrypoint = Url::parse(&config.entrypoint).map_err(|e| {
            PostalError::Config(format!("invalid entrypoint {}: {e}", config.entrypoint))
        })?;
        if entrypoint.cannot_be_a_base() {
            return Err(PostalError::Config(format!(
                "entrypoint {} cannot carry a path",
                config.entrypoint
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| PostalError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            entrypoint,
            username: config.username.clone(),
            password: config.password.clone(),
            index: config.index.clone(),
            doc_type: config.doc_type.clone(),
            refresh_on_write: config.refresh_on_write,
        })
    }

    /// URL under the entrypoint with each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.entrypoint.clone();
        // cannot_be_a_base was rejected in from_config
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn write_url(&self, segments: &[&str]) -> Url {
        let mut url = self.url(segments);
        if self.refresh_on_write {
            url.query_pairs_mut().append_pair("refresh", "wait_for");
        }
        url
    }

    fn document_segments<'a>(&'a self, id: &'a str) -> Vec<&'a str> {
        match self.doc_type.as_deref() {
            Some(doc_type) => vec![self.index.as_str(), doc_type, id],
            None => vec![self.index.as_str(), "_doc", id],
        }
    }

    fn update_segments<'a>(&'a self, id: &'a str) -> Vec<&'a str> {
        match self.doc_type.as_deref() {
            Some(doc_type) => vec![self.index.as_str(), doc_type, id, "_update"],
            None => vec![self.index.as_str(), "_update", id],
        }
    }

    fn search_segments(&self) -> Vec<&str> {
        match self.doc_type.as_deref() {
            Some(doc_type) => vec![self.index.as_str(), doc_type, "_search"],
            None => vec![self.index.as_str(), "_search"],
        }
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_deref()),
            None => builder,
        }
    }

    /// Send a request, recording latency and transport failures.
    async fn send(&self, operation: &'static str, builder: RequestBuilder) -> Result<Response> {
        let start = Instant::now();
        let response = builder.send().await.map_err(|e| {
            crate::metrics::BACKEND_ERRORS_TOTAL
                .with_label_values(&[operation])
                .inc();
            PostalError::Http(e)
        })?;
        let elapsed = start.elapsed();
        debug!(
            elapsed_ms = elapsed.as_millis(),
            status = response.status().as_u16(),
            operation,
            "backend request"
        );
        crate::metrics::BACKEND_OPERATION_DURATION
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
        Ok(response)
    }
}

/// Turn a non-success response into `PostalError::Backend`, preferring the
/// `error.reason` field of Elasticsearch error bodies.
async fn backend_error(operation: &'static str, response: Response) -> PostalError {
    crate::metrics::BACKEND_ERRORS_TOTAL
        .with_label_values(&[operation])
        .inc();
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let reason = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v["error"]["reason"]
                .as_str()
                .or_else(|| v["error"].as_str())
                .map(String::from)
        })
        .unwrap_or(body);
    PostalError::Backend { status, reason }
}

/// Ids that URL path normalization folds into the parent path; no document
/// can be addressed by them.
fn is_dot_segment(id: &str) -> bool {
    matches!(id, "." | "..")
}

fn error_type(body: &Value) -> Option<&str> {
    body["error"]["type"].as_str()
}

#[async_trait]
impl SearchBackend for ElasticBackend {
    fn index_name(&self) -> &str {
        &self.index
    }

    #[instrument(skip(self), fields(entrypoint = %self.entrypoint))]
    async fn ping(&self) -> Result<PingInfo> {
        let response = self
            .send("ping", self.request(Method::GET, self.entrypoint.clone()))
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(backend_error("ping", response).await);
        }
        let info: RootInfo = response.json().await?;
        Ok(PingInfo {
            status: status.as_u16(),
            version: info.version.number,
        })
    }

    #[instrument(skip(self), fields(index = %self.index))]
    async fn index_exists(&self) -> Result<bool> {
        let url = self.url(&[self.index.as_str()]);
        let response = self
            .send("index_exists", self.request(Method::HEAD, url))
            .await?;
        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(backend_error("index_exists", response).await),
        }
    }

    #[instrument(skip(self, schema), fields(index = %self.index))]
    async fn create_index(&self, schema: &Value) -> Result<bool> {
        let url = self.url(&[self.index.as_str()]);
        let response = self
            .send("create_index", self.request(Method::PUT, url).json(schema))
            .await?;
        if !response.status().is_success() {
            return Err(backend_error("create_index", response).await);
        }
        let ack: Acknowledged = response.json().await?;
        Ok(ack.acknowledged)
    }

    #[instrument(skip(self, request), fields(index = %self.index, term = request.term()))]
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Hit>> {
        let url = self.url(&self.search_segments());
        let response = self
            .send("search", self.request(Method::POST, url).json(request))
            .await?;
        if !response.status().is_success() {
            return Err(backend_error("search", response).await);
        }
        let result: SearchResponse = response.json().await?;
        debug!(hits = result.hits.hits.len(), "search returned");
        Ok(result.hits.hits)
    }

    #[instrument(skip(self), fields(index = %self.index))]
    async fn get(&self, id: &str) -> Result<Option<Value>> {
        if is_dot_segment(id) {
            return Ok(None);
        }
        let url = self.url(&self.document_segments(id));
        let response = self.send("get", self.request(Method::GET, url)).await?;
        match response.status() {
            s if s.is_success() => {
                let doc: GetResponse = response.json().await?;
                Ok(doc.found.then_some(doc.source).flatten())
            }
            StatusCode::NOT_FOUND => {
                let body: Value = response.json().await.unwrap_or(Value::Null);
                if body.get("found") == Some(&Value::Bool(false)) {
                    Ok(None)
                } else {
                    Err(PostalError::Backend {
                        status: 404,
                        reason: error_type(&body).unwrap_or("not found").to_string(),
                    })
                }
            }
            _ => Err(backend_error("get", response).await),
        }
    }

    #[instrument(skip(self, doc), fields(index = %self.index))]
    async fn index(&self, id: &str, doc: &Document) -> Result<()> {
        if is_dot_segment(id) {
            return Err(PostalError::Validation(format!(
                "document id '{id}' is not addressable"
            )));
        }
        let url = self.write_url(&self.document_segments(id));
        let response = self
            .send("index", self.request(Method::PUT, url).json(doc))
            .await?;
        if !response.status().is_success() {
            return Err(backend_error("index", response).await);
        }
        Ok(())
    }

    #[instrument(skip(self, patch), fields(index = %self.index))]
    async fn update(&self, id: &str, patch: &NewDocument) -> Result<bool> {
        if is_dot_segment(id) {
            return Ok(false);
        }
        let url = self.write_url(&self.update_segments(id));
        let body = json!({ "doc": patch });
        let response = self
            .send("update", self.request(Method::POST, url).json(&body))
            .await?;
        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => {
                let body: Value = response.json().await.unwrap_or(Value::Null);
                match error_type(&body) {
                    Some("document_missing_exception") => Ok(false),
                    other => Err(PostalError::Backend {
                        status: 404,
                        reason: other.unwrap_or("not found").to_string(),
                    }),
                }
            }
            _ => Err(backend_error("update", response).await),
        }
    }

    #[instrument(skip(self), fields(index = %self.index))]
    async fn delete(&self, id: &str) -> Result<bool> {
        if is_dot_segment(id) {
            return Ok(false);
        }
        let url = self.write_url(&self.document_segments(id));
        let response = self
            .send("delete", self.request(Method::DELETE, url))
            .await?;
        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => {
                let body: Value = response.json().await.unwrap_or(Value::Null);
                match error_type(&body) {
                    None => Ok(false),
                    Some(kind) => Err(PostalError::Backend {
                        status: 404,
                        reason: kind.to_string(),
                    }),
                }
            }
            _ => Err(backend_error("delete", response).await),
        }
    }
}
