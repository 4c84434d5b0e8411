use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::analysis::{autocomplete_grams, query_tokens};
use crate::error::{PostalError, Result};
use crate::query::{Query, SearchRequest, SortOrder};
use crate::types::{Document, NewDocument};

use super::traits::{Hit, PingInfo, SearchBackend};

/// Version reported by [`InMemoryBackend::ping`].
pub const IN_MEMORY_VERSION: &str = "in-memory";

/// Process-local backend that mirrors the index schema and term query.
///
/// Documents are analyzed with the same edge n-gram analyzer the
/// Elasticsearch index declares, so prefix searches behave the same way.
/// Operations on a missing index fail like the real backend does.
pub struct InMemoryBackend {
    index: String,
    version: String,
    exists: AtomicBool,
    documents: DashMap<String, Document>,
}

impl InMemoryBackend {
    /// An empty backend whose index has not been created yet.
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            version: IN_MEMORY_VERSION.to_string(),
            exists: AtomicBool::new(false),
            documents: DashMap::new(),
        }
    }

    /// Override the version string reported by `ping`.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn require_index(&self) -> Result<()> {
        if self.exists.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(PostalError::Backend {
                status: 404,
                reason: format!("no such index [{}]", self.index),
            })
        }
    }
}

/// Whether every query token matches a gram in at least one searched field.
fn matches(doc: &Document, fields: &[String], tokens: &[String]) -> bool {
    let grams: Vec<String> = fields
        .iter()
        .flat_map(|field| autocomplete_grams(field_value(doc, field)))
        .collect();
    tokens.iter().all(|token| grams.iter().any(|g| g == token))
}

fn field_value<'a>(doc: &'a Document, field: &str) -> &'a str {
    match field.split('.').next() {
        Some("id") => &doc.id,
        Some("ciudad") => &doc.ciudad,
        Some("colonia") => &doc.colonia,
        Some("cp") => &doc.cp,
        Some("delegacion") => &doc.delegacion,
        _ => "",
    }
}

#[async_trait]
impl SearchBackend for InMemoryBackend {
    fn index_name(&self) -> &str {
        &self.index
    }

    async fn ping(&self) -> Result<PingInfo> {
        Ok(PingInfo {
            status: 200,
            version: self.version.clone(),
        })
    }

    async fn index_exists(&self) -> Result<bool> {
        Ok(self.exists.load(Ordering::Acquire))
    }

    async fn create_index(&self, _schema: &Value) -> Result<bool> {
        if self.exists.swap(true, Ordering::AcqRel) {
            return Err(PostalError::Backend {
                status: 400,
                reason: format!("index [{}] already exists", self.index),
            });
        }
        Ok(true)
    }

    #[instrument(skip(self, request), fields(index = %self.index, term = request.term()))]
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Hit>> {
        self.require_index()?;
        let Query::MultiMatch(multi_match) = &request.query;
        let tokens = query_tokens(&multi_match.query);

        let mut found: Vec<Document> = self
            .documents
            .iter()
            .filter(|entry| matches(entry.value(), &multi_match.fields, &tokens))
            .map(|entry| entry.value().clone())
            .collect();

        for clause in request.sort.iter().rev() {
            found.sort_by(|a, b| {
                let ord = field_value(a, &clause.field).cmp(field_value(b, &clause.field));
                match clause.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }
        found.truncate(request.size);
        debug!(hits = found.len(), "search returned");

        found
            .into_iter()
            .map(|doc| -> Result<Hit> {
                Ok(Hit {
                    id: doc.id.clone(),
                    source: serde_json::to_value(&doc)?,
                })
            })
            .collect()
    }

    async fn get(&self, id: &str) -> Result<Option<Value>> {
        self.require_index()?;
        match self.documents.get(id) {
            Some(doc) => Ok(Some(serde_json::to_value(doc.value())?)),
            None => Ok(None),
        }
    }

    async fn index(&self, id: &str, doc: &Document) -> Result<()> {
        // Elasticsearch creates the index on first write.
        self.exists.store(true, Ordering::Release);
        self.documents.insert(id.to_string(), doc.clone());
        Ok(())
    }

    async fn update(&self, id: &str, patch: &NewDocument) -> Result<bool> {
        self.require_index()?;
        match self.documents.get_mut(id) {
            Some(mut doc) => {
                let current_id = std::mem::take(&mut doc.id);
                *doc = patch.clone().with_id(current_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.require_index()?;
        Ok(self.documents.remove(id).is_some())
    }
}
