mod common;

use std::sync::Arc;

use axum::http::Method;
use serde_json::json;

use common::mock_elastic::{MockElastic, BROKEN_INDEX, MOCK_VERSION};
use common::server::colonia;
use postal_search::backend::{ElasticBackend, SearchBackend};
use postal_search::config::BackendConfig;
use postal_search::documents::DocumentService;
use postal_search::error::PostalError;
use postal_search::query::build_term_query;

fn backend_config(entrypoint: &str) -> BackendConfig {
    BackendConfig {
        entrypoint: entrypoint.to_string(),
        username: None,
        password: None,
        index: "postal_codes".to_string(),
        doc_type: None,
        request_timeout_secs: 5,
        refresh_on_write: false,
        create_index_on_startup: true,
    }
}

fn service(config: &BackendConfig) -> DocumentService {
    let backend = ElasticBackend::from_config(config).unwrap();
    DocumentService::new(Arc::new(backend)).with_doc_type(config.doc_type.clone())
}

#[tokio::test]
async fn test_ping_reads_version() {
    let (mock, url) = MockElastic::start().await;
    let svc = service(&backend_config(&url));

    assert_eq!(
        svc.ping().await.unwrap(),
        format!("Elasticsearch returned with code 200 and version {MOCK_VERSION}")
    );
    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::GET);
    assert_eq!(requests[0].path, "/");
    assert!(requests[0].authorization.is_none());
}

#[tokio::test]
async fn test_basic_auth_sent_when_configured() {
    let (mock, url) = MockElastic::start().await;
    let mut config = backend_config(&url);
    config.username = Some("elastic".to_string());
    config.password = Some("changeme".to_string());
    service(&config).ping().await.unwrap();

    let auth = mock.requests()[0].authorization.clone().unwrap();
    // base64("elastic:changeme")
    assert_eq!(auth, "Basic ZWxhc3RpYzpjaGFuZ2VtZQ==");
}

#[tokio::test]
async fn test_ensure_index_sends_schema_once() {
    let (mock, url) = MockElastic::start().await;
    let svc = service(&backend_config(&url));

    assert!(svc.ensure_index().await.unwrap());
    assert!(!svc.ensure_index().await.unwrap());

    let heads = mock.requests_with(Method::HEAD);
    assert_eq!(heads.len(), 2);
    assert!(heads.iter().all(|r| r.path == "/postal_codes"));

    let puts = mock.requests_with(Method::PUT);
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].path, "/postal_codes");
    let body = puts[0].body.as_ref().unwrap();
    assert_eq!(
        body["settings"]["index"]["analysis"]["filter"]["engram"]["type"],
        "edge_ngram"
    );
    assert_eq!(
        body["mappings"]["properties"]["colonia"]["fields"]["raw"]["type"],
        "keyword"
    );
    assert_eq!(body["mappings"]["properties"]["location"]["type"], "geo_point");
}

#[tokio::test]
async fn test_ensure_index_nests_legacy_type() {
    let (mock, url) = MockElastic::start().await;
    let mut config = backend_config(&url);
    config.doc_type = Some("postal_code".to_string());
    service(&config).ensure_index().await.unwrap();

    let put = &mock.requests_with(Method::PUT)[0];
    let body = put.body.as_ref().unwrap();
    assert_eq!(
        body["mappings"]["postal_code"]["properties"]["cp"]["analyzer"],
        "autocomplete"
    );
}

#[tokio::test]
async fn test_document_crud_paths() {
    let (mock, url) = MockElastic::start().await;
    let svc = service(&backend_config(&url));
    svc.ensure_index().await.unwrap();
    mock.clear_requests();

    let id = svc.create_document(colonia("Roma Norte", "06700")).await.unwrap();
    let stored = svc.read_document(&id).await.unwrap();
    assert_eq!(stored["id"], id.as_str());
    assert_eq!(stored["colonia"], "Roma Norte");

    svc.update_document(&id, colonia("Roma Sur", "06760"))
        .await
        .unwrap();
    assert!(svc.delete_document(&id).await.unwrap());
    assert!(!svc.delete_document(&id).await.unwrap());

    let seen: Vec<(Method, String)> = mock
        .requests()
        .into_iter()
        .map(|r| (r.method, r.path))
        .collect();
    let doc_path = format!("/postal_codes/_doc/{id}");
    assert_eq!(
        seen,
        vec![
            (Method::PUT, doc_path.clone()),
            (Method::GET, doc_path.clone()),
            (Method::POST, format!("/postal_codes/_update/{id}")),
            (Method::DELETE, doc_path.clone()),
            (Method::DELETE, doc_path),
        ]
    );

    let update = &mock.requests_with(Method::POST)[0];
    let body = update.body.as_ref().unwrap();
    assert_eq!(body["doc"]["colonia"], "Roma Sur");
    assert_eq!(body["doc"]["cp"], "06760");
    assert!(body["doc"].get("id").is_none());
}

#[tokio::test]
async fn test_missing_documents() {
    let (_mock, url) = MockElastic::start().await;
    let svc = service(&backend_config(&url));
    svc.ensure_index().await.unwrap();

    assert!(matches!(
        svc.read_document("nope").await,
        Err(PostalError::NotFound { .. })
    ));
    assert!(matches!(
        svc.update_document("nope", colonia("x", "0")).await,
        Err(PostalError::NotFound { .. })
    ));
    assert!(!svc.delete_document("nope").await.unwrap());
}

#[tokio::test]
async fn test_dot_ids_never_reach_backend() {
    let (mock, url) = MockElastic::start().await;
    let svc = service(&backend_config(&url));
    svc.ensure_index().await.unwrap();
    mock.clear_requests();

    for id in [".", ".."] {
        assert!(matches!(
            svc.read_document(id).await,
            Err(PostalError::NotFound { .. })
        ));
        assert!(matches!(
            svc.update_document(id, colonia("x", "0")).await,
            Err(PostalError::NotFound { .. })
        ));
        assert!(!svc.delete_document(id).await.unwrap());
    }
    assert!(mock.requests().is_empty());

    let backend = ElasticBackend::from_config(&backend_config(&url)).unwrap();
    let doc = colonia("x", "0").with_id("..".to_string());
    let err = backend.index("..", &doc).await.unwrap_err();
    assert!(matches!(err, PostalError::Validation(_)));
    assert!(!err.is_fatal());
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_search_posts_typed_query() {
    let (mock, url) = MockElastic::start().await;
    let svc = service(&backend_config(&url));
    svc.ensure_index().await.unwrap();
    svc.create_document(colonia("Roma Sur", "06760")).await.unwrap();
    svc.create_document(colonia("Roma Norte", "06700")).await.unwrap();
    mock.clear_requests();

    let docs = svc.search("  Roma ").await.unwrap();
    let names: Vec<&str> = docs.iter().map(|d| d.colonia.as_str()).collect();
    assert_eq!(names, vec!["Roma Norte", "Roma Sur"]);

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/postal_codes/_search");
    let expected = serde_json::to_value(build_term_query("Roma").unwrap()).unwrap();
    assert_eq!(requests[0].body.as_ref().unwrap(), &expected);
    assert_eq!(expected["sort"], json!([{ "colonia.raw": { "order": "asc" } }]));
}

#[tokio::test]
async fn test_empty_search_never_reaches_backend() {
    let (mock, url) = MockElastic::start().await;
    let svc = service(&backend_config(&url));

    assert!(matches!(svc.search(" ").await, Err(PostalError::EmptyQuery)));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_refresh_on_write_query() {
    let (mock, url) = MockElastic::start().await;
    let mut config = backend_config(&url);
    config.refresh_on_write = true;
    let svc = service(&config);
    svc.ensure_index().await.unwrap();
    mock.clear_requests();

    svc.create_document(colonia("Doctores", "06720")).await.unwrap();
    let put = &mock.requests_with(Method::PUT)[0];
    assert_eq!(put.query.as_deref(), Some("refresh=wait_for"));
}

#[tokio::test]
async fn test_backend_error_reason_is_surfaced() {
    let (_mock, url) = MockElastic::start().await;
    let mut config = backend_config(&url);
    config.index = BROKEN_INDEX.to_string();
    let backend = ElasticBackend::from_config(&config).unwrap();

    let err = backend
        .search(&build_term_query("Roma").unwrap())
        .await
        .unwrap_err();
    match err {
        PostalError::Backend { status, reason } => {
            assert_eq!(status, 500);
            assert_eq!(reason, "all shards failed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(PostalError::Backend {
        status: 500,
        reason: String::new()
    }
    .is_fatal());
}

#[tokio::test]
async fn test_unreachable_backend_is_http_error() {
    let backend = ElasticBackend::from_config(&backend_config("http://127.0.0.1:9")).unwrap();
    let err = backend.ping().await.unwrap_err();
    assert!(matches!(err, PostalError::Http(_)));
    assert_eq!(err.status_code(), 502);
}
