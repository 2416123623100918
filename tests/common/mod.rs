#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

/// Serves `router` on an ephemeral localhost port and returns its base url
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Answers every request to `path` with `status` and `body`, counting hits
pub fn canned(
    method: &str,
    path: &str,
    status: StatusCode,
    body: Value,
) -> (Router, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let handler = move || {
        counter.fetch_add(1, Ordering::SeqCst);
        let body = body.clone();
        async move { (status, Json(body)) }
    };

    let route = match method {
        "POST" => post(handler),
        _ => get(handler),
    };
    (Router::new().route(path, route), hits)
}

/// Answers `path` with 503 for the first `failures` requests, then 200 and `body`
pub fn flaky(path: &str, failures: usize, body: Value) -> (Router, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let handler = move || {
        let attempt = counter.fetch_add(1, Ordering::SeqCst);
        let body = body.clone();
        async move {
            if attempt < failures {
                (StatusCode::SERVICE_UNAVAILABLE, "try again").into_response()
            } else {
                (StatusCode::OK, Json(body)).into_response()
            }
        }
    };
    (Router::new().route(path, get(handler)), hits)
}

/// A healthy Bor, Heimdall and staking API behind one server
pub fn polygon_upstream(block: &str, height: u64, checkpoint: u64, signed: u64) -> Router {
    let bor = json!({ "jsonrpc": "2.0", "id": 1, "result": { "number": block } });
    let heimdall = json!({ "height": height, "result": { "id": checkpoint } });
    let staking = json!({ "success": true, "result": [{ "checkpointNumber": signed }] });

    Router::new()
        .route(
            "/",
            post(move || {
                let bor = bor.clone();
                async move { Json(bor) }
            }),
        )
        .route(
            "/checkpoints/latest",
            get(move || {
                let heimdall = heimdall.clone();
                async move { Json(heimdall) }
            }),
        )
        .route(
            "/api/v2/validators/:id/checkpoints-signed",
            get(move || {
                let staking = staking.clone();
                async move { Json(staking) }
            }),
        )
}
