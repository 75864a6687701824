use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 5xx 响应中对外暴露的统一文案（细节仅写入日志）
pub const GENERIC_INTERNAL_MESSAGE: &str = "Internal server error";

/// 应用统一错误类型
#[derive(Error, Debug, utoipa::ToSchema)]
pub enum AppError {
    /// 参数校验错误（缺失/空白/格式不正确）
    #[error("{0}")]
    Validation(String),

    /// 资源不存在
    #[error("{0}")]
    NotFound(String),

    /// 图像渲染错误
    #[error("图像渲染错误: {0}")]
    ImageRendererError(String),

    /// 变体存储读写错误
    #[error("存储错误: {0}")]
    Storage(String),

    /// 内部服务器错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 变体存储层错误（后端 I/O、渲染、键校验）
#[derive(Error, Debug)]
pub enum StoreError {
    /// 首字母/文件名无法作为单段存储路径使用
    #[error("'{0}' cannot be used as a storage key")]
    InvalidKey(String),

    /// 变体数量越界（调用方应在进入存储层之前完成校验）
    #[error("num_variants must be an integer between 1 and {max}, got {count}")]
    InvalidCount { count: usize, max: usize },

    /// 请求的变体不存在
    #[error("variant not found: {0}")]
    NotFound(String),

    /// 渲染失败
    #[error("render failed: {0}")]
    Render(String),

    /// 后端 I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 后端内部状态异常（如锁中毒）
    #[error("存储后端异常: {0}")]
    Backend(String),
}

/// RFC7807 风格的错误响应（Problem Details），额外携带兼容字段 `error`。
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    /// 问题类型（URI）
    #[serde(rename = "type")]
    #[schema(example = "about:blank")]
    pub type_url: String,

    /// 简短标题
    #[schema(example = "Bad Request")]
    pub title: String,

    /// HTTP 状态码（与响应 status 一致）
    #[schema(example = 400)]
    pub status: u16,

    /// 稳定的错误码，用于程序化处理
    #[schema(example = "VALIDATION_FAILED")]
    pub code: String,

    /// 可直接展示给调用方的错误信息；5xx 时为通用文案
    #[schema(example = "Both first_name and last_name are required")]
    pub error: String,

    /// 可选：请求追踪 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ImageRendererError(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn stable_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ImageRendererError(_) => "IMAGE_RENDER_FAILED",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn title(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::NOT_FOUND => "Not Found",
            StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
            _ => "Error",
        }
    }

    /// 对外可见的错误文案：4xx 原样回显违反的约束，5xx 统一降级为通用文案。
    pub fn public_message(&self) -> String {
        if self.status_code().is_server_error() {
            GENERIC_INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidKey(_) | StoreError::InvalidCount { .. } => {
                AppError::Validation(err.to_string())
            }
            StoreError::NotFound(_) => AppError::NotFound("Image not found".to_string()),
            StoreError::Render(msg) => AppError::ImageRendererError(msg),
            StoreError::Io(_) | StoreError::Backend(_) => AppError::Storage(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.stable_code(), "请求处理失败: {}", self);
        }

        let problem = ProblemDetails {
            type_url: "about:blank".to_string(),
            title: self.title().to_string(),
            status: status.as_u16(),
            code: self.stable_code().to_string(),
            error: self.public_message(),
            request_id: crate::request_id::current_request_id(),
        };

        let mut res = Json(problem).into_response();
        *res.status_mut() = status;
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        res
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, GENERIC_INTERNAL_MESSAGE, StoreError};
    use axum::http::StatusCode;

    #[test]
    fn store_errors_map_onto_http_taxonomy() {
        let e: AppError = StoreError::InvalidKey("./".into()).into();
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);

        let e: AppError = StoreError::InvalidCount { count: 20, max: 12 }.into();
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);

        let e: AppError = StoreError::NotFound("AS/AS_variant9.png".into()).into();
        assert_eq!(e.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(e.public_message(), "Image not found");

        let e: AppError = StoreError::Backend("lock poisoned".into()).into();
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn server_errors_do_not_leak_detail() {
        let e = AppError::Storage("/srv/data/AS: permission denied".into());
        assert_eq!(e.public_message(), GENERIC_INTERNAL_MESSAGE);

        let e = AppError::Validation("Both first_name and last_name are required".into());
        assert_eq!(
            e.public_message(),
            "Both first_name and last_name are required"
        );
    }
}
