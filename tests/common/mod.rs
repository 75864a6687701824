#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use initials_avatar::error::StoreError;
use initials_avatar::features::avatar::{
    AvatarRenderer, Initials, MemoryBackend, VariantBackend, VariantStore,
};
use initials_avatar::{AppState, build_router};

/// 不依赖字体的渲染器：输出 `首字母:颜色` 字节
pub struct TagRenderer;

impl AvatarRenderer for TagRenderer {
    fn render(&self, initials: &Initials, background: &str) -> Result<Vec<u8>, StoreError> {
        Ok(format!("{initials}:{background}").into_bytes())
    }
}

pub fn app_with_backend(backend: Arc<dyn VariantBackend>) -> Router {
    let store = Arc::new(VariantStore::new(backend, Arc::new(TagRenderer)));
    build_router(AppState::new(store, 2))
}

pub fn app() -> (Router, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    (app_with_backend(backend.clone()), backend)
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

pub async fn body_bytes(resp: Response<Body>) -> Vec<u8> {
    to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

pub async fn body_json(resp: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(resp).await).expect("parse json")
}
