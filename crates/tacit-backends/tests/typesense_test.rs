//! Integration tests for the Typesense backend against a mock server.

use std::time::Duration;

use serde_json::json;
use tacit_backends::{TypesenseBackend, TypesenseConfig};
use tacit_core::{Error, SearchBackend, SearchQuery};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> TypesenseBackend {
    let addr = server.address();
    let config = TypesenseConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        protocol: "http".to_string(),
        api_key: "test-key".to_string(),
    };
    TypesenseBackend::new(config, Duration::from_secs(5)).expect("Failed to create backend")
}

fn query() -> SearchQuery {
    SearchQuery {
        collection: "candidates_candidates".into(),
        q: "python".into(),
        query_by: vec!["first_name".into(), "skills".into()],
        page: 1,
        per_page: 100,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_search_sends_key_and_joined_params() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/collections/candidates_candidates/documents/search"))
        .and(header("X-TYPESENSE-API-KEY", "test-key"))
        .and(query_param("q", "python"))
        .and(query_param("query_by", "first_name,skills"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "100"))
        .and(query_param_is_missing("filter_by"))
        .and(query_param_is_missing("sort_by"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "found": 1,
            "page": 1,
            "request_params": {"per_page": 100},
            "hits": [{
                "document": {"id": "c1", "first_name": "Ada"},
                "text_match": 578730123365187705u64,
                "highlights": [{"field": "first_name", "snippet": "<mark>Ada</mark>"}]
            }],
            "facet_counts": [{"field_name": "location", "counts": [{"value": "Berlin", "count": 3}]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = backend(&server).search(&query()).await.unwrap();

    assert_eq!(response.found, 1);
    assert_eq!(response.per_page, 100);
    assert_eq!(response.hits[0].document["first_name"], "Ada");
    assert_eq!(response.hits[0].text_match, Some(578730123365187705));
    assert_eq!(response.hits[0].highlights[0].field, "first_name");
    assert_eq!(response.facet_counts[0].counts[0].count, 3);
}

#[tokio::test]
async fn test_filters_joined_with_conjunction() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("filter_by", "years:>5 && location:Berlin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"found": 0, "hits": []})))
        .expect(1)
        .mount(&server)
        .await;

    let q = SearchQuery {
        filter_by: vec!["years:>5".into(), "location:Berlin".into()],
        ..query()
    };
    let response = backend(&server).search(&q).await.unwrap();
    assert_eq!(response.found, 0);
    assert_eq!(response.page, 1);
}

#[tokio::test]
async fn test_error_status_is_backend_error_with_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message": "Not Found"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let err = backend(&server).search(&query()).await.unwrap_err();
    match err {
        Error::Backend(msg) => {
            assert!(msg.contains("404"), "message: {}", msg);
            assert!(msg.contains("Not Found"), "message: {}", msg);
        }
        other => panic!("expected Backend error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_backend_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = backend(&server).search(&query()).await.unwrap_err();
    assert!(err.is_fallback_eligible());
}

#[tokio::test]
async fn test_list_collections() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/collections"))
        .and(header("X-TYPESENSE-API-KEY", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "candidates_candidates", "num_documents": 1200, "fields": []},
            {"name": "candidates_candidate-attachments"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let collections = backend(&server).list_collections().await.unwrap();
    assert_eq!(collections.len(), 2);
    assert_eq!(collections[0].num_documents, 1200);
    assert_eq!(collections[1].num_documents, 0);
}
