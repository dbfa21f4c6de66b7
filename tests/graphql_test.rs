use std::time::{Duration, Instant};

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rickdash::cancel::{CancelReason, CancellationManager};
use rickdash::error::{ErrorKind, RickdashError};
use rickdash::source::{CharacterFilter, GraphQlSource, PageRequest, PageSource};
use rickdash::types::CharacterStatus;

fn source_for(server: &MockServer) -> GraphQlSource {
    GraphQlSource::new(&format!("{}/graphql", server.uri())).unwrap()
}

fn characters_body() -> serde_json::Value {
    json!({
        "data": {
            "characters": {
                "info": { "count": 826, "pages": 42, "next": 2, "prev": null },
                "results": [
                    {
                        "id": "1",
                        "name": "Rick Sanchez",
                        "status": "Alive",
                        "species": "Human",
                        "gender": "Male",
                        "origin": { "id": "1", "name": "Earth (C-137)" },
                        "location": { "id": "3", "name": "Citadel of Ricks" },
                        "image": "https://rickandmortyapi.com/api/character/avatar/1.jpeg"
                    },
                    null,
                    {
                        "id": "8",
                        "name": "Adjudicator Rick",
                        "status": "Dead",
                        "species": "Human",
                        "gender": "Male",
                        "origin": { "id": null, "name": "unknown" },
                        "location": null,
                        "image": null
                    }
                ]
            }
        }
    })
}

#[tokio::test]
async fn test_fetch_page_parses_characters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(characters_body()))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server);
    let manager = CancellationManager::new();
    let token = manager.current();
    let page = source
        .fetch_page(&PageRequest::first(None), &token)
        .await
        .unwrap();

    assert_eq!(page.info.count, 826);
    assert_eq!(page.info.next, Some(2));
    assert_eq!(page.info.prev, None);
    assert_eq!(page.results.len(), 2);
    assert_eq!(page.results[0].name, "Rick Sanchez");
    assert_eq!(page.results[0].location.name, "Citadel of Ricks");
    assert_eq!(page.results[1].status, CharacterStatus::Dead);
    assert_eq!(page.results[1].location.name, "");
}

#[tokio::test]
async fn test_fetch_page_sends_page_and_filter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "variables": { "page": 3, "filter": { "name": "Rick", "status": "dead" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(characters_body()))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server);
    let manager = CancellationManager::new();
    let token = manager.current();
    let request = PageRequest {
        page: 3,
        filter: CharacterFilter::build(Some("Rick"), Some("dead"), Some("all")),
    };
    source.fetch_page(&request, &token).await.unwrap();
}

#[tokio::test]
async fn test_null_connection_is_empty_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "characters": null } })),
        )
        .mount(&server)
        .await;

    let source = source_for(&server);
    let manager = CancellationManager::new();
    let token = manager.current();
    let page = source
        .fetch_page(&PageRequest::first(None), &token)
        .await
        .unwrap();
    assert!(page.results.is_empty());
    assert_eq!(page.info.next, None);
}

#[tokio::test]
async fn test_rate_limit_status_and_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "17"))
        .mount(&server)
        .await;

    let source = source_for(&server);
    let manager = CancellationManager::new();
    let token = manager.current();
    let err = source
        .fetch_page(&PageRequest::first(None), &token)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(429));
    assert_eq!(err.kind(), ErrorKind::RateLimited);
    assert_eq!(err.retry_after(), Some(Duration::from_secs(17)));
}

#[tokio::test]
async fn test_server_error_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = source_for(&server);
    let manager = CancellationManager::new();
    let token = manager.current();
    let err = source
        .fetch_page(&PageRequest::first(None), &token)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.kind(), ErrorKind::Api);
}

#[tokio::test]
async fn test_graphql_errors_are_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{
                "message": "Too many requests, please slow down",
                "path": ["characters"],
                "extensions": { "code": "RATE_LIMITED" }
            }]
        })))
        .mount(&server)
        .await;

    let source = source_for(&server);
    let manager = CancellationManager::new();
    let token = manager.current();
    let err = source
        .fetch_page(&PageRequest::first(None), &token)
        .await
        .unwrap_err();

    match &err {
        RickdashError::GraphQlErrors {
            errors,
            partial_data,
        } => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].code.as_deref(), Some("RATE_LIMITED"));
            assert_eq!(errors[0].path.as_deref(), Some("characters"));
            assert!(!partial_data);
        }
        other => panic!("expected GraphQL errors, got {other:?}"),
    }
    // Classification reads messages, not extension codes.
    assert_eq!(err.kind(), ErrorKind::Api);
}

#[tokio::test]
async fn test_cancellation_aborts_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(characters_body())
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let source = source_for(&server);
    let manager = CancellationManager::new();
    let token = manager.current();

    let started = Instant::now();
    let fetch = tokio::spawn({
        let token = token.clone();
        async move { source.fetch_page(&PageRequest::first(None), &token).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    manager.renew();

    let err = fetch.await.unwrap().unwrap_err();
    assert!(matches!(err, RickdashError::Cancelled(CancelReason::Superseded)));
    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_page_beyond_graphql_int_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(characters_body()))
        .expect(0)
        .mount(&server)
        .await;

    let source = source_for(&server);
    let manager = CancellationManager::new();
    let token = manager.current();
    let request = PageRequest {
        page: u32::MAX,
        filter: None,
    };
    let err = source.fetch_page(&request, &token).await.unwrap_err();

    assert!(matches!(err, RickdashError::Other(_)));
    assert!(err.to_string().contains("out of range"));
}

#[tokio::test]
async fn test_fetch_character_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "variables": { "id": "2" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "character": {
                    "id": "2",
                    "name": "Morty Smith",
                    "status": "Alive",
                    "species": "Human",
                    "type": "",
                    "gender": "Male",
                    "origin": { "id": null, "name": "unknown", "dimension": null },
                    "location": {
                        "id": "20",
                        "name": "Earth (Replacement Dimension)",
                        "dimension": "Replacement Dimension"
                    },
                    "image": "https://rickandmortyapi.com/api/character/avatar/2.jpeg",
                    "episode": [
                        { "id": "1", "name": "Pilot", "episode": "S01E01" },
                        { "id": "2", "name": "Lawnmower Dog", "episode": "S01E02" }
                    ],
                    "created": "2017-11-04T18:50:21.651Z"
                }
            }
        })))
        .mount(&server)
        .await;

    let source = source_for(&server);
    let detail = source.fetch_character("2").await.unwrap();

    assert_eq!(detail.character.name, "Morty Smith");
    assert_eq!(
        detail.character.location.dimension.as_deref(),
        Some("Replacement Dimension")
    );
    assert_eq!(detail.episodes.len(), 2);
    assert_eq!(detail.episodes[1].code, "S01E02");
    assert_eq!(detail.created.as_deref(), Some("2017-11-04T18:50:21.651Z"));
}

#[tokio::test]
async fn test_missing_character_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "character": null } })),
        )
        .mount(&server)
        .await;

    let source = source_for(&server);
    let err = source.fetch_character("99999").await.unwrap_err();
    assert!(matches!(err, RickdashError::NotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
