use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::query::SearchRequest;
use crate::types::{Document, NewDocument};

/// Outcome of a liveness probe against the backend entrypoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingInfo {
    /// HTTP status code returned by the entrypoint.
    pub status: u16,
    /// Backend version number, e.g. `8.11.1`.
    pub version: String,
}

/// One search hit: the document id and its stored `_source`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_source", default)]
    pub source: Value,
}

/// Operations the document service needs from a search engine.
///
/// Every method targets the single index the backend was configured with.
/// Implementations must be safe to share across request tasks.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Name of the index this backend reads and writes.
    fn index_name(&self) -> &str;

    /// Liveness probe.
    async fn ping(&self) -> Result<PingInfo>;

    /// Whether the configured index exists.
    async fn index_exists(&self) -> Result<bool>;

    /// Create the index with the given settings/mappings body.
    /// Returns the backend's `acknowledged` flag.
    async fn create_index(&self, schema: &Value) -> Result<bool>;

    /// Run a term search, returning hits in backend order.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Hit>>;

    /// Stored payload of a document, `None` when the id is unknown.
    async fn get(&self, id: &str) -> Result<Option<Value>>;

    /// Store (create or replace) a document under `id`.
    async fn index(&self, id: &str, doc: &Document) -> Result<()>;

    /// Overwrite the mutable fields of an existing document.
    /// Returns `false` when no document has this id.
    async fn update(&self, id: &str, patch: &NewDocument) -> Result<bool>;

    /// Remove a document. Returns `false` when no document has this id.
    async fn delete(&self, id: &str) -> Result<bool>;
}
