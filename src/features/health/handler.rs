use axum::{Json, Router, routing::get};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::state::{AppState, SERVICE_NAME, now_timestamp};

/// 健康检查响应
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    #[schema(example = "healthy")]
    pub status: String,
    /// 服务名称
    #[schema(example = "MyTempleYatra Profile Image Generator")]
    pub service: String,
    /// 当前时间（RFC3339）
    pub timestamp: String,
}

/// 根路径的服务描述
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ServiceDescriptor {
    pub service: String,
    pub version: String,
    pub status: String,
    /// 端点名称 → 路径
    pub endpoints: BTreeMap<String, String>,
    pub documentation: String,
}

#[utoipa::path(
    get,
    path = "/health",
    summary = "健康检查",
    description = "用于探活的健康检查端点，返回服务状态与当前时间。",
    responses((status = 200, description = "服务健康", body = HealthResponse)),
    tag = "Health"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        timestamp: now_timestamp(),
    })
}

#[utoipa::path(
    get,
    path = "/",
    summary = "服务描述",
    responses((status = 200, description = "服务信息与端点列表", body = ServiceDescriptor)),
    tag = "Health"
)]
pub async fn index() -> Json<ServiceDescriptor> {
    let endpoints = [
        ("health", "/health"),
        ("generate", "/generate"),
        ("generate_variants", "/generate-variants"),
        ("bulk_generate", "/bulk-generate"),
        ("colors", "/colors"),
        ("stats", "/stats"),
        ("image_serve", "/image/<initials>/<filename>"),
        ("image_base64", "/image-base64/<initials>/<filename>"),
        ("docs", "/docs"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    Json(ServiceDescriptor {
        service: format!("{SERVICE_NAME} API"),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
        endpoints,
        documentation: r#"Send POST requests to /generate with JSON: {"first_name": "John", "last_name": "Doe"}"#
            .to_string(),
    })
}

pub fn create_health_router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
}
