use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Inspection, CHUNKS, NOT_JSON_FIXTURE, OBJECT_FIXTURE};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(body.to_string())
        .unwrap()
}

// --- echo ---

#[tokio::test]
async fn echo_returns_body_verbatim() {
    let payload = r#"{"nested":{"list":[1,2,3]},"ok":true}"#;
    for method in ["GET", "POST", "PUT", "DELETE"] {
        let resp = app().oneshot(request(method, "/echo", payload)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{method}");
        assert_eq!(body_bytes(resp).await, payload.as_bytes(), "{method}");
    }
}

#[tokio::test]
async fn echo_empty_body() {
    let resp = app().oneshot(request("POST", "/echo", "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());
}

// --- inspect ---

#[tokio::test]
async fn inspect_reports_method_path_headers_and_body() {
    let req = Request::builder()
        .method("PUT")
        .uri("/inspect?page=2")
        .header("x-call", "first")
        .header(http::header::AUTHORIZATION, "Bearer t")
        .body(r#"{"n":1}"#.to_string())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let seen: Inspection = body_json(resp).await;
    assert_eq!(seen.method, "PUT");
    assert_eq!(seen.path, "/inspect");
    assert_eq!(seen.query.as_deref(), Some("page=2"));
    assert_eq!(seen.headers["x-call"], "first");
    assert_eq!(seen.headers["authorization"], "Bearer t");
    assert_eq!(seen.body, r#"{"n":1}"#);
}

// --- fixtures ---

#[tokio::test]
async fn object_fixture_for_every_method() {
    for method in ["GET", "POST", "PUT", "DELETE"] {
        let resp = app()
            .oneshot(request(method, "/fixture/object", ""))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[http::header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(body_bytes(resp).await, OBJECT_FIXTURE.as_bytes());
    }
}

#[tokio::test]
async fn not_json_fixture() {
    let resp = app()
        .oneshot(request("GET", "/fixture/not-json", ""))
        .await
        .unwrap();
    assert_eq!(body_bytes(resp).await, NOT_JSON_FIXTURE.as_bytes());
}

#[tokio::test]
async fn empty_fixture() {
    let resp = app()
        .oneshot(request("GET", "/fixture/empty", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());
}

// --- chunked ---

#[tokio::test]
async fn chunked_body_concatenates() {
    let resp = app().oneshot(request("GET", "/chunked", "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, CHUNKS.concat().as_bytes());
}

// --- status ---

#[tokio::test]
async fn status_route_uses_requested_code() {
    let resp = app()
        .oneshot(request("DELETE", "/status/404", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({ "status": 404 }));
}

#[tokio::test]
async fn status_route_rejects_non_numeric_code() {
    let resp = app()
        .oneshot(request("GET", "/status/teapot", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
