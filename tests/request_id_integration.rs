mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use common::{app, body_json, post_json};

fn header_of(resp: &axum::http::Response<Body>, name: &str) -> String {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

#[tokio::test]
async fn request_id_is_generated_when_missing() {
    let (app, _) = app();
    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .expect("request /health");

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        !header_of(&resp, "x-request-id").is_empty(),
        "x-request-id should be generated"
    );
}

#[tokio::test]
async fn request_id_uses_client_value_when_valid() {
    let (app, _) = app();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/colors")
                .header("x-request-id", "client.req-001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request /colors");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_of(&resp, "x-request-id"), "client.req-001");
}

#[tokio::test]
async fn unsafe_client_request_id_is_replaced() {
    let (app, _) = app();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "has spaces;and=junk")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request /health");

    let id = header_of(&resp, "x-request-id");
    assert!(!id.is_empty());
    assert_ne!(id, "has spaces;and=junk");
}

#[tokio::test]
async fn problem_details_contains_request_id() {
    let (app, _) = app();
    let mut req = post_json("/generate", "{}");
    req.headers_mut()
        .insert("x-request-id", "err.req-001".parse().unwrap());
    let resp = app.oneshot(req).await.expect("request /generate");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let request_id_header = header_of(&resp, "x-request-id");
    assert_eq!(request_id_header, "err.req-001");

    let json = body_json(resp).await;
    assert_eq!(json["requestId"].as_str(), Some(request_id_header.as_str()));
    assert_eq!(json["code"].as_str(), Some("VALIDATION_FAILED"));
    assert_eq!(json["status"].as_u64(), Some(400));
}
