use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::features::avatar::{FontCandidate, FsBackend, InitialsRenderer, VariantStore};

/// 执行启动检查并装配变体仓库
///
/// 1. 检查并创建头像存储根目录
/// 2. 按候选链解析字体（仅告警，不阻断启动）
pub async fn run_startup_checks(config: &AppConfig) -> Result<Arc<VariantStore>, AppError> {
    tracing::info!("🔍 开始执行启动检查...");

    let backend = ensure_output_dir(config)?;

    // 系统字体扫描可能较慢，放到阻塞线程池中
    let candidates = FontCandidate::chain_from_paths(&config.image.font_paths);
    let optimize_speed = config.image.optimize_speed;
    let t_font = std::time::Instant::now();
    let renderer = tokio::task::spawn_blocking(move || {
        InitialsRenderer::from_candidates(&candidates, optimize_speed)
    })
    .await
    .map_err(|e| AppError::Internal(format!("字体解析任务失败: {e}")))?;
    if renderer.font().origin() == "system" || renderer.font().face_count() == 0 {
        tracing::warn!("⚠️ 配置的字体均不可用，已回退到系统字体（排版效果可能下降）");
    }
    tracing::info!("字体解析完成: {}ms", t_font.elapsed().as_millis());

    tracing::info!("✅ 启动检查完成");
    Ok(Arc::new(VariantStore::new(
        Arc::new(backend),
        Arc::new(renderer),
    )))
}

/// 确保存储根目录存在
fn ensure_output_dir(config: &AppConfig) -> Result<FsBackend, AppError> {
    let output_dir = config.output_dir();
    if !output_dir.exists() {
        tracing::warn!("📁 未找到存储目录，正在创建: {:?}", output_dir);
    }
    let backend = FsBackend::open(&output_dir)
        .map_err(|e| AppError::Internal(format!("创建存储目录失败 {output_dir:?}: {e}")))?;
    tracing::info!("✅ 存储目录就绪: {:?}", backend.root());
    Ok(backend)
}
