use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument, Instrument};
use uuid::Uuid;

use crate::backend::SearchBackend;
use crate::error::{PostalError, Result};
use crate::logging::component_span;
use crate::query::{build_term_query, SearchRequest};
use crate::schema::index_schema;
use crate::types::{Document, NewDocument};

/// Postal-document operations on top of a search backend.
///
/// Owns the backend handle; cloning shares it.
#[derive(Clone)]
pub struct DocumentService {
    backend: Arc<dyn SearchBackend>,
    doc_type: Option<String>,
}

impl DocumentService {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            doc_type: None,
        }
    }

    /// Declare index mappings under a legacy mapping type.
    pub fn with_doc_type(mut self, doc_type: Option<String>) -> Self {
        self.doc_type = doc_type;
        self
    }

    pub fn index_name(&self) -> &str {
        self.backend.index_name()
    }

    /// Create the index with the autocomplete schema unless it already exists.
    /// Returns `true` when the index was created by this call.
    #[instrument(skip(self), fields(index = self.index_name()))]
    pub async fn ensure_index(&self) -> Result<bool> {
        let backend = self.backend.clone();
        let schema = index_schema(self.doc_type.as_deref());
        async move {
            if backend.index_exists().await? {
                return Ok(false);
            }
            if !backend.create_index(&schema).await? {
                return Err(PostalError::IndexNotAcknowledged {
                    index: backend.index_name().to_string(),
                });
            }
            info!(index = backend.index_name(), "index created");
            Ok(true)
        }
        .instrument(component_span("elasticsearch"))
        .await
    }

    /// Liveness probe; the message embeds the status code and backend version.
    pub async fn ping(&self) -> Result<String> {
        let info = self.backend.ping().await?;
        Ok(format!(
            "Elasticsearch returned with code {} and version {}",
            info.status, info.version
        ))
    }

    /// See [`build_term_query`].
    pub fn build_term_query(&self, term: &str) -> Result<SearchRequest> {
        build_term_query(term)
    }

    /// Term search, at most ten documents ordered by neighborhood.
    #[instrument(skip(self), fields(index = self.index_name()))]
    pub async fn search(&self, term: &str) -> Result<Vec<Document>> {
        let request = match build_term_query(term) {
            Ok(request) => request,
            Err(e) => {
                crate::metrics::SEARCHES_TOTAL
                    .with_label_values(&["rejected"])
                    .inc();
                return Err(e);
            }
        };
        let hits = self.backend.search(&request).await?;
        let documents = hits
            .into_iter()
            .map(|hit| serde_json::from_value::<Document>(hit.source))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        crate::metrics::SEARCHES_TOTAL
            .with_label_values(&["ok"])
            .inc();
        crate::metrics::SEARCH_HITS
            .with_label_values(&[self.index_name()])
            .observe(documents.len() as f64);
        Ok(documents)
    }

    /// Stored payload of a document as the backend returns it.
    #[instrument(skip(self), fields(index = self.index_name()))]
    pub async fn read_document(&self, id: &str) -> Result<Value> {
        self.backend
            .get(id)
            .await?
            .ok_or_else(|| PostalError::NotFound { id: id.to_string() })
    }

    /// Store a new document under a fresh UUID v4 and return that id.
    #[instrument(skip(self, doc), fields(index = self.index_name()))]
    pub async fn create_document(&self, doc: NewDocument) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let document = doc.with_id(id.clone());
        self.backend.index(&id, &document).await?;
        crate::metrics::DOCUMENT_WRITES_TOTAL
            .with_label_values(&["create"])
            .inc();
        info!(id = %id, "document created");
        Ok(id)
    }

    /// Overwrite every mutable field of an existing document.
    #[instrument(skip(self, doc), fields(index = self.index_name()))]
    pub async fn update_document(&self, id: &str, doc: NewDocument) -> Result<String> {
        if !self.backend.update(id, &doc).await? {
            return Err(PostalError::NotFound { id: id.to_string() });
        }
        crate::metrics::DOCUMENT_WRITES_TOTAL
            .with_label_values(&["update"])
            .inc();
        Ok(id.to_string())
    }

    /// Remove a document; `false` when nothing had this id.
    #[instrument(skip(self), fields(index = self.index_name()))]
    pub async fn delete_document(&self, id: &str) -> Result<bool> {
        let found = self.backend.delete(id).await?;
        if found {
            crate::metrics::DOCUMENT_WRITES_TOTAL
                .with_label_values(&["delete"])
                .inc();
        }
        Ok(found)
    }
}
