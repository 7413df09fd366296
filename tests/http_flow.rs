//! End-to-end HTTP tests against a live server.

mod common;

use common::{raw_request, start_server, test_config};
use serde_json::Value;

#[tokio::test]
async fn status_route_returns_json_envelope() {
    let server = start_server(test_config()).await;

    let res = reqwest::get(server.url("/api/status")).await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        "application/json; charset=utf-8"
    );
    assert_eq!(res.headers().get("connection").unwrap(), "close");
    assert!(res.headers().contains_key("x-request-id"));

    let json: Value = res.json().await.unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "running");

    server.stop().await;
}

#[tokio::test]
async fn unknown_path_is_404_page() {
    let server = start_server(test_config()).await;

    let res = reqwest::get(server.url("/does/not/exist")).await.unwrap();
    assert_eq!(res.status(), 404);
    let body = res.text().await.unwrap();
    assert!(body.contains("Page not found"));

    server.stop().await;
}

#[tokio::test]
async fn malformed_request_line_is_400() {
    let server = start_server(test_config()).await;

    let out = raw_request(server.addr, b"GARBAGE\r\n\r\n").await;
    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{out}");

    let out = raw_request(server.addr, b"BREW /pot HTTP/1.1\r\n\r\n").await;
    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{out}");

    server.stop().await;
}

#[tokio::test]
async fn path_parameter_and_query() {
    let server = start_server(test_config()).await;

    let json: Value = reqwest::get(server.url("/users/42"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["data"]["id"], "42");

    let html = reqwest::get(server.url("/template?name=Ada"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Hello, Ada!"));

    server.stop().await;
}

#[tokio::test]
async fn json_body_is_echoed() {
    let server = start_server(test_config()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/api/echo"))
        .json(&serde_json::json!({ "greeting": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let json: Value = res.json().await.unwrap();
    assert_eq!(json["data"]["greeting"], "hi");

    server.stop().await;
}

#[tokio::test]
async fn session_cookie_round_trip() {
    let server = start_server(test_config()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/api/session?user=alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let cookie = res
        .headers()
        .get("set-cookie")
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session_id="));

    let json: Value = client
        .get(server.url("/api/session"))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["data"]["user_id"], "alice");
    assert_eq!(json["data"]["authenticated"], true);

    let res = client
        .delete(server.url("/api/session"))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = client
        .get(server.url("/api/session"))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    server.stop().await;
}

#[tokio::test]
async fn stats_count_requests() {
    let server = start_server(test_config()).await;

    for _ in 0..3 {
        reqwest::get(server.url("/api/hello")).await.unwrap();
    }
    let json: Value = reqwest::get(server.url("/api/stats"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(json["data"]["requests_served"].as_u64().unwrap() >= 4);
    assert!(json["data"]["bytes_sent"].as_u64().unwrap() > 0);

    server.stop().await;
}

#[tokio::test]
async fn rate_limit_rejects_excess_requests() {
    let mut config = test_config();
    config.features.rate_limiting = true;
    config.rate_limit.requests_per_minute = 2;
    let server = start_server(config).await;

    let mut statuses = Vec::new();
    for _ in 0..3 {
        statuses.push(reqwest::get(server.url("/api/hello")).await.unwrap().status());
    }
    assert_eq!(statuses[0], 200);
    assert_eq!(statuses[1], 200);
    assert_eq!(statuses[2], 429);

    server.stop().await;
}

#[tokio::test]
async fn static_files_reject_traversal() {
    let server = start_server(test_config()).await;

    let out = raw_request(server.addr, b"GET /static/../Cargo.toml HTTP/1.1\r\n\r\n").await;
    assert!(out.starts_with("HTTP/1.1 403 Forbidden\r\n"), "{out}");

    server.stop().await;
}
