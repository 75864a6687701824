use chrono::{SecondsFormat, Utc};
use std::sync::Arc;

use crate::features::avatar::{AvatarService, VariantStore};

/// 对外展示的服务名称
pub const SERVICE_NAME: &str = "MyTempleYatra Profile Image Generator";

/// 聚合的应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub avatar: AvatarService,
}

impl AppState {
    /// `max_parallel` 为同时进行的渲染任务上限
    pub fn new(store: Arc<VariantStore>, max_parallel: usize) -> Self {
        Self {
            avatar: AvatarService::new(store, max_parallel),
        }
    }
}

/// 当前 UTC 时间（RFC3339，毫秒精度）
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
