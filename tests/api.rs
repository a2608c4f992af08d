//! API endpoint integration tests

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;

mod common;
use common::{EMPTY_ID, FLAPPY_ID, build_test_router, seeded_store};

async fn get(router: axum::Router, uri: &str) -> (StatusCode, String) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn get_json(router: axum::Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(router, uri).await;
    (status, serde_json::from_str(&body).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, json) = get_json(build_test_router(seeded_store()), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_ready_reports_store_and_summary() {
    let (status, json) = get_json(build_test_router(seeded_store()), "/ready").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["checks"]["store"]["status"], "ok");
    assert_eq!(json["checks"]["summary"]["status"], "unavailable");
}

#[tokio::test]
async fn test_ready_degraded_when_store_offline() {
    let store = seeded_store();
    store.set_offline(true);
    let (status, json) = get_json(build_test_router(store), "/ready").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["store"]["status"], "fail");
}

#[tokio::test]
async fn test_conversation_json() {
    let (status, json) = get_json(
        build_test_router(seeded_store()),
        &format!("/api/conversations/{FLAPPY_ID}"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["overview"]["title"], "Flappy Bird Clone");
    assert_eq!(json["overview"]["stats"]["total"], 2);

    // user message, context, assistant message
    let timeline = json["timeline"].as_array().unwrap();
    assert_eq!(timeline.len(), 3);
    assert_eq!(timeline[1]["title"], "Context Used");
}

#[tokio::test]
async fn test_conversation_not_found() {
    let (status, json) =
        get_json(build_test_router(seeded_store()), "/api/conversations/missing").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
    assert_eq!(json["error"]["retryable"], false);
}

#[tokio::test]
async fn test_conversation_store_offline() {
    let store = seeded_store();
    store.set_offline(true);
    let (status, json) = get_json(
        build_test_router(store),
        &format!("/api/conversations/{FLAPPY_ID}"),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "unavailable");
    assert_eq!(json["error"]["retryable"], true);
}

#[tokio::test]
async fn test_summary_requires_api_key() {
    let (status, json) = get_json(
        build_test_router(seeded_store()),
        &format!("/api/conversations/{FLAPPY_ID}/summary"),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "not_configured");
}

#[tokio::test]
async fn test_search_json() {
    let (status, json) = get_json(build_test_router(seeded_store()), "/api/search?q=flappy").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["query"], "flappy");
    assert_eq!(json["count"], 1);
    assert_eq!(json["results"][0]["id"], FLAPPY_ID);
}

#[tokio::test]
async fn test_search_rejects_bad_parameters() {
    let (status, json) = get_json(
        build_test_router(seeded_store()),
        "/api/search?q=flappy&start_date=yesterday",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"]["message"].as_str().unwrap().contains("start_date"));
}

#[tokio::test]
async fn test_home_page() {
    let (status, html) = get(build_test_router(seeded_store()), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Conversation Viewer"));
    assert!(html.contains("Search Conversations"));
}

#[tokio::test]
async fn test_conversation_page() {
    let (status, html) = get(
        build_test_router(seeded_store()),
        &format!("/conversations?id={FLAPPY_ID}"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Flappy Bird Clone"));
    assert!(html.contains("View Context Data"));
    assert!(html.contains("Rigidbody2D &lt;manual&gt;"));
    assert!(!html.contains("Rigidbody2D <manual>"));
}

#[tokio::test]
async fn test_conversation_page_without_messages() {
    let (status, html) = get(
        build_test_router(seeded_store()),
        &format!("/conversations?id={EMPTY_ID}"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("No messages found in the conversation"));
}

#[tokio::test]
async fn test_conversation_page_not_found() {
    let (status, html) = get(build_test_router(seeded_store()), "/conversations?id=missing").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(html.contains("No conversation found with ID missing."));
}

#[tokio::test]
async fn test_conversation_page_offline_offers_retry() {
    let store = seeded_store();
    store.set_offline(true);
    let (status, html) = get(build_test_router(store), "/conversations?id=conv-flappy").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(html.contains("Retry"));
    assert!(html.contains("href=\"/conversations?id=conv-flappy\""));
}

#[tokio::test]
async fn test_search_page_prompts_for_term() {
    let (status, html) = get(build_test_router(seeded_store()), "/search?q=").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Please enter a search term."));
}

#[tokio::test]
async fn test_search_page_results() {
    let (status, html) = get(build_test_router(seeded_store()), "/search?q=gadget").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Found 1 conversations"));
    assert!(html.contains("href=\"/conversations?id=conv-gadget\""));
}

#[tokio::test]
async fn test_search_page_no_results() {
    let (status, html) = get(build_test_router(seeded_store()), "/search?q=zebra").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("No conversations found matching your search."));
}
