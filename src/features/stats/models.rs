use serde::Serialize;

/// 单个首字母分组的变体数量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct GroupCount {
    #[schema(example = "AS")]
    pub initials: String,
    #[schema(example = 3)]
    pub variants: usize,
}

/// 统计快照：每次请求时现场扫描得出，不做持久化
#[derive(Debug, Clone, Default, Serialize, utoipa::ToSchema)]
pub struct StatsSnapshot {
    pub total_initials: usize,
    pub total_variants: usize,
    pub initials_generated: Vec<GroupCount>,
}

/// GET /stats 响应
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: StatsSnapshot,
    /// RFC3339 时间戳
    pub timestamp: String,
}
