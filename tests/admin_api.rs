//! Admin endpoint tests against a live listener.

use axum::http::StatusCode;
use serde_json::{json, Value};
use service_bootstrap::lifecycle::start_server;
use service_bootstrap::{Params, Reply};

mod common;

async fn hello() -> Reply<Value> {
    Reply(json!({"hello": "world"}))
}

async fn create(params: Params) -> Reply<Value> {
    Reply(Value::Object(params.into_map()))
}

#[tokio::test]
async fn test_status_reports_ok_and_debug_info() {
    let (_, logger) = common::memory_logger();
    let handle = common::builder("status-app", 28311, logger)
        .start()
        .await
        .unwrap();

    let res = common::client()
        .get(format!("{}/_status", handle.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "OK");
    assert_eq!(body["info"]["name"], "status-app");
    assert_eq!(body["info"]["url"], handle.url());
    assert_eq!(body["info"]["route_count"], 2);
    assert!(body["info"]["middleware"]
        .as_array()
        .unwrap()
        .contains(&json!("cors")));

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_routes_lists_user_routes_before_admin_routes() {
    let (_, logger) = common::memory_logger();
    let handle = common::builder("routes-app", 28312, logger)
        .get("/a", hello)
        .unwrap()
        .post("/items", create)
        .unwrap()
        .start()
        .await
        .unwrap();

    let res = common::client()
        .get(format!("{}/api/admin/_routes", handle.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "GET": ["/a", "/_status", "/api/admin/_routes"],
            "PUT": [],
            "DELETE": [],
            "POST": ["/items"],
        })
    );

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_start_server_logs_listening_line() {
    let (sink, logger) = common::memory_logger();
    let handle = common::builder("boot-app", 28313, logger.clone())
        .start()
        .await
        .unwrap();

    let line = sink
        .records()
        .into_iter()
        .find(|r| r.message.contains("listening at"))
        .expect("startup line");
    assert_eq!(line.message, format!("boot-app listening at {}", handle.url()));

    handle.shutdown().await.unwrap();

    // Plain bootstrap on the default host also answers the admin routes.
    let handle = start_server("plain-app", 28314, Some(logger)).await.unwrap();
    let res = common::client()
        .get("http://127.0.0.1:28314/_status")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (_, logger) = common::memory_logger();
    let handle = common::builder("missing-app", 28315, logger)
        .start()
        .await
        .unwrap();

    let res = common::client()
        .get(format!("{}/nope", handle.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "ResourceNotFound");

    handle.shutdown().await.unwrap();
}
