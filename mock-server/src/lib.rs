use std::{collections::BTreeMap, convert::Infallible, time::Duration};

use axum::{
    body::{Body, Bytes},
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::any,
    Json, Router,
};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// Body served by the `/fixture/object` route.
pub const OBJECT_FIXTURE: &str = r#"{"a":1}"#;

/// Body served by the `/fixture/not-json` route.
pub const NOT_JSON_FIXTURE: &str = "not-json";

/// Pieces streamed by `/chunked`, one write each.
pub const CHUNKS: [&str; 4] = [r#"{"parts":["#, r#""one","#, r#""tw"#, r#"o"],"done":true}"#];

/// How long `/slow` waits before answering.
pub const SLOW_DELAY: Duration = Duration::from_secs(2);

/// What the server saw, as returned by `/inspect`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Inspection {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// Every route accepts any method.
pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/inspect", any(inspect))
        .route("/fixture/object", any(object_fixture))
        .route("/fixture/not-json", any(not_json_fixture))
        .route("/fixture/empty", any(empty_fixture))
        .route("/chunked", any(chunked))
        .route("/slow", any(slow))
        .route("/status/{code}", any(status))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(body: Bytes) -> Bytes {
    tracing::debug!(bytes = body.len(), "echo");
    body
}

async fn inspect(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Inspection> {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    Json(Inspection {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn object_fixture() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], OBJECT_FIXTURE)
}

async fn not_json_fixture() -> &'static str {
    NOT_JSON_FIXTURE
}

async fn empty_fixture() -> StatusCode {
    StatusCode::OK
}

async fn chunked() -> Body {
    let stream = futures_util::stream::iter(CHUNKS).then(|part| async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok::<_, Infallible>(Bytes::from_static(part.as_bytes()))
    });
    Body::from_stream(stream)
}

async fn slow() -> Json<serde_json::Value> {
    tokio::time::sleep(SLOW_DELAY).await;
    Json(serde_json::json!({ "slow": true }))
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, Json<serde_json::Value>), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, Json(serde_json::json!({ "status": code }))))
}
