use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::error::PostalError;
use crate::server::AppState;
use crate::types::{Document, NewDocument};

use super::{ApiError, PrettyJson};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Free-text term. A missing parameter is treated as empty.
    #[serde(default)]
    pub q: String,
}

/// Unreadable bodies are a caller mistake, answered with a 400 JSON error.
fn document_body(body: Result<Json<NewDocument>, JsonRejection>) -> Result<NewDocument, ApiError> {
    body.map(|Json(doc)| doc)
        .map_err(|rejection| ApiError(PostalError::Validation(rejection.body_text())))
}

/// Backend liveness as a plain-text status line.
#[instrument(skip(state))]
pub async fn ping(State(state): State<AppState>) -> Result<String, ApiError> {
    state.documents.ping().await.map_err(|e| state.fail(e))
}

/// Term search over all postal fields.
#[instrument(skip(state), fields(q = %params.q))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<PrettyJson<Vec<Document>>, ApiError> {
    let documents = state
        .documents
        .search(&params.q)
        .await
        .map_err(|e| state.fail(e))?;
    info!(hits = documents.len(), "search served");
    Ok(PrettyJson(documents))
}

/// Stored payload of one document.
#[instrument(skip(state))]
pub async fn read_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<PrettyJson<Value>, ApiError> {
    let doc = state
        .documents
        .read_document(&id)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(PrettyJson(doc))
}

/// Creates a document with a server-generated UUID v4 id.
#[instrument(skip(state, body))]
pub async fn create_document(
    State(state): State<AppState>,
    body: Result<Json<NewDocument>, JsonRejection>,
) -> Result<(StatusCode, PrettyJson<Value>), ApiError> {
    let doc = document_body(body)?;
    let id = state
        .documents
        .create_document(doc)
        .await
        .map_err(|e| state.fail(e))?;
    Ok((StatusCode::CREATED, PrettyJson(json!({ "id": id }))))
}

/// Replaces the mutable fields of an existing document.
#[instrument(skip(state, body))]
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<NewDocument>, JsonRejection>,
) -> Result<PrettyJson<Value>, ApiError> {
    let doc = document_body(body)?;
    let id = state
        .documents
        .update_document(&id, doc)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(PrettyJson(json!({ "id": id })))
}

#[instrument(skip(state))]
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<PrettyJson<Value>, ApiError> {
    let found = state
        .documents
        .delete_document(&id)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(PrettyJson(json!({ "found": found })))
}
