use axum::{
    Json, Router,
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as base64_engine};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::palette::{BACKGROUND_COLORS, PALETTE_DESCRIPTION};
use super::store::IMAGE_CONTENT_TYPE;
use super::types::{
    BulkGenerateRequest, BulkGenerateResponse, BulkItemResult, ColorsResponse, GenerateRequest,
    GenerateResponse, GenerateVariantsRequest, GenerateVariantsResponse, ImageBase64Response,
    UserInfo, parse_num_variants,
};
use crate::{error::AppError, state::AppState};

/// 变体文件在重新生成前不会变化，允许客户端缓存一天
const IMAGE_CACHE_CONTROL: &str = "public, max-age=86400";

/// JSON 请求体提取器：不要求 Content-Type，空体/非法 JSON/非对象一律映射为校验错误。
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read request body: {e}")))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(AppError::Validation("No JSON data provided".to_string()));
        }

        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|_| AppError::Validation("Invalid JSON format".to_string()))?;
        if !value.is_object() {
            return Err(AppError::Validation(
                "Request body must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value)
            .map(JsonBody)
            .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))
    }
}

#[utoipa::path(
    post,
    path = "/generate",
    summary = "为单个用户生成头像",
    description = "根据姓名派生两位大写首字母，从已有变体中随机返回一张；该首字母尚无变体时先生成 3 张。",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "生成成功", body = GenerateResponse),
        (status = 400, description = "姓名缺失或请求体非法", body = crate::error::ProblemDetails, content_type = "application/problem+json"),
        (status = 500, description = "渲染或存储失败", body = crate::error::ProblemDetails, content_type = "application/problem+json")
    ),
    tag = "Avatar"
)]
pub async fn generate(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let user = UserInfo::from_names(req.first_name.as_deref(), req.last_name.as_deref())?;
    let image = state.avatar.random_variant(user.initials.clone()).await?;

    tracing::info!(
        "Generated profile image for {} {} (initials: {})",
        user.first_name,
        user.last_name,
        user.initials
    );
    Ok(Json(GenerateResponse {
        success: true,
        message: format!(
            "Profile image generated successfully for {} {}",
            user.first_name, user.last_name
        ),
        user_info: user,
        image,
    }))
}

#[utoipa::path(
    post,
    path = "/generate-variants",
    summary = "为首字母生成多个变体",
    description = "生成 num_variants（1-12，默认 3）张不同背景色的变体，覆盖同名文件。",
    request_body = GenerateVariantsRequest,
    responses(
        (status = 200, description = "生成成功", body = GenerateVariantsResponse),
        (status = 400, description = "姓名缺失或 num_variants 越界", body = crate::error::ProblemDetails, content_type = "application/problem+json"),
        (status = 500, description = "渲染或存储失败", body = crate::error::ProblemDetails, content_type = "application/problem+json")
    ),
    tag = "Avatar"
)]
pub async fn generate_variants(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<GenerateVariantsRequest>,
) -> Result<Json<GenerateVariantsResponse>, AppError> {
    let user = UserInfo::from_names(req.first_name.as_deref(), req.last_name.as_deref())?;
    let count = parse_num_variants(req.num_variants.as_ref())?;
    let variants = state
        .avatar
        .generate_variants(user.initials.clone(), count)
        .await?;

    tracing::info!(
        "Generated {} variants for {} {}",
        variants.len(),
        user.first_name,
        user.last_name
    );
    Ok(Json(GenerateVariantsResponse {
        success: true,
        message: format!(
            "Generated {} variants for {} {}",
            variants.len(),
            user.first_name,
            user.last_name
        ),
        total_variants: variants.len(),
        user_info: user,
        variants,
    }))
}

#[utoipa::path(
    post,
    path = "/bulk-generate",
    summary = "批量生成头像",
    description = "逐条处理 users 数组；单条失败只记录在该条结果中，不影响整批，始终返回 200。",
    request_body = BulkGenerateRequest,
    responses(
        (status = 200, description = "逐条结果与成功/失败计数", body = BulkGenerateResponse),
        (status = 400, description = "users 缺失或不是数组", body = crate::error::ProblemDetails, content_type = "application/problem+json")
    ),
    tag = "Avatar"
)]
pub async fn bulk_generate(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<BulkGenerateRequest>,
) -> Result<Json<BulkGenerateResponse>, AppError> {
    let users = match req.users {
        None | Some(Value::Null) => {
            return Err(AppError::Validation("Users array is required".to_string()));
        }
        Some(Value::Array(users)) => users,
        Some(_) => return Err(AppError::Validation("Users must be an array".to_string())),
    };

    let total_users = users.len();
    let mut results = Vec::with_capacity(total_users);
    for user in users {
        let outcome = match UserInfo::from_json(&user) {
            Ok(info) => state
                .avatar
                .random_variant(info.initials.clone())
                .await
                .map(|image| (info, image)),
            Err(e) => Err(e),
        };
        match outcome {
            Ok((info, image)) => results.push(BulkItemResult::succeeded(user, info.initials, image)),
            Err(e) => {
                if e.status_code().is_server_error() {
                    tracing::error!("批量生成单条失败: {}", e);
                } else {
                    tracing::warn!("批量生成单条校验失败: {}", e);
                }
                results.push(BulkItemResult::failed(user, &e));
            }
        }
    }

    let successful = results.iter().filter(|r| r.success).count();
    tracing::info!(
        "Bulk generation finished: {}/{} succeeded",
        successful,
        total_users
    );
    Ok(Json(BulkGenerateResponse {
        success: true,
        total_users,
        successful_generations: successful,
        failed_generations: total_users - successful,
        results,
    }))
}

#[utoipa::path(
    get,
    path = "/image/{initials}/{filename}",
    summary = "获取头像图片",
    params(
        ("initials" = String, Path, description = "首字母目录，例如 AS"),
        ("filename" = String, Path, description = "文件名，例如 AS_variant1.png")
    ),
    responses(
        (status = 200, description = "PNG 图片字节", content_type = "image/png"),
        (status = 404, description = "图片不存在", body = crate::error::ProblemDetails, content_type = "application/problem+json")
    ),
    tag = "Avatar"
)]
pub async fn serve_image(
    State(state): State<AppState>,
    Path((initials, filename)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let bytes = state.avatar.read_image(initials, filename).await?;
    Ok((
        [
            (header::CONTENT_TYPE, IMAGE_CONTENT_TYPE),
            (header::CACHE_CONTROL, IMAGE_CACHE_CONTROL),
        ],
        bytes,
    ))
}

#[utoipa::path(
    get,
    path = "/image-base64/{initials}/{filename}",
    summary = "以 base64 data URI 获取头像图片",
    params(
        ("initials" = String, Path, description = "首字母目录，例如 AS"),
        ("filename" = String, Path, description = "文件名，例如 AS_variant1.png")
    ),
    responses(
        (status = 200, description = "base64 编码的图片", body = ImageBase64Response),
        (status = 404, description = "图片不存在", body = crate::error::ProblemDetails, content_type = "application/problem+json")
    ),
    tag = "Avatar"
)]
pub async fn serve_image_base64(
    State(state): State<AppState>,
    Path((initials, filename)): Path<(String, String)>,
) -> Result<Json<ImageBase64Response>, AppError> {
    let bytes = state
        .avatar
        .read_image(initials.clone(), filename.clone())
        .await?;
    Ok(Json(ImageBase64Response {
        success: true,
        image_base64: format!(
            "data:{IMAGE_CONTENT_TYPE};base64,{}",
            base64_engine.encode(bytes)
        ),
        initials,
        filename,
    }))
}

#[utoipa::path(
    get,
    path = "/colors",
    summary = "可用背景色",
    responses((status = 200, description = "固定色板", body = ColorsResponse)),
    tag = "Avatar"
)]
pub async fn list_colors() -> Json<ColorsResponse> {
    Json(ColorsResponse {
        success: true,
        colors: BACKGROUND_COLORS.iter().map(|c| c.to_string()).collect(),
        total_colors: BACKGROUND_COLORS.len(),
        description: PALETTE_DESCRIPTION.to_string(),
    })
}

pub fn create_avatar_router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate))
        .route("/generate-variants", post(generate_variants))
        .route("/bulk-generate", post(bulk_generate))
        .route("/image/:initials/:filename", get(serve_image))
        .route("/image-base64/:initials/:filename", get(serve_image_base64))
        .route("/colors", get(list_colors))
}
