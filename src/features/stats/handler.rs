use axum::{Json, Router, extract::State, routing::get};

use super::{models::StatsResponse, reporter};
use crate::error::AppError;
use crate::state::{AppState, now_timestamp};

#[utoipa::path(
    get,
    path = "/stats",
    summary = "生成统计",
    description = "扫描存储目录，返回首字母分组数、变体总数以及每个分组的变体数。",
    responses(
        (status = 200, description = "统计快照", body = StatsResponse),
        (
            status = 500,
            description = "存储扫描失败",
            body = crate::error::ProblemDetails,
            content_type = "application/problem+json"
        )
    ),
    tag = "Stats"
)]
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    let store = state.avatar.store().clone();
    let stats = tokio::task::spawn_blocking(move || reporter::collect(store.backend()))
        .await
        .map_err(|e| AppError::Internal(format!("统计扫描任务执行失败: {e}")))??;

    Ok(Json(StatsResponse {
        success: true,
        stats,
        timestamp: now_timestamp(),
    }))
}

pub fn create_stats_router() -> Router<AppState> {
    Router::new().route("/stats", get(get_stats))
}
