//! Full router over a real socket with fake collaborators.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::net::SocketAddr;

use serde_json::{json, Value};

use rebuild_gateway::app_state::AppState;
use rebuild_gateway::config::RebuildConfig;
use rebuild_gateway::router::build_router;

mod mocks;
use mocks::{EngineScript, MockEngineFactory, MockTransfer};

async fn serve(script: EngineScript) -> SocketAddr {
    let state = AppState::with_collaborators(
        RebuildConfig::default(),
        MockEngineFactory::new(script),
        MockTransfer::new(),
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn base64_rebuild_over_http() {
    let addr = serve(EngineScript::default()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/api/v1/rebuild/base64"))
        .body(json!({ "Base64": "SU4=" }).to_string())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let headers = resp.headers().clone();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["cache-control"], "no-cache");
    assert_eq!(headers["pragma"], "no-cache");
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["gw-version"], "1.2.3.4");
    assert_eq!(headers["gw-metric-protectedfilesize"], "3");

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "Base64": "T1VU" }));

    let metrics = client
        .get(format!("http://{addr}/metrics"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains("rebuild_workflow_results_total{"));
    assert!(metrics.contains("workflow=\"rebuild_base64\""));
    assert!(metrics.contains("file_type=\"Pdf\""));
}

#[tokio::test]
async fn unmatched_route_and_liveness() {
    let addr = serve(EngineScript::default()).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://{addr}/nowhere"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");

    let resp = client
        .get(format!("http://{addr}/healthz"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");
}
