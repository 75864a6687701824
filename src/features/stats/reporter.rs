use crate::error::StoreError;
use crate::features::avatar::VariantBackend;
use crate::features::avatar::store::parse_variant_number;

use super::models::{GroupCount, StatsSnapshot};

/// 扫描存储后端，按需计算统计快照（无缓存、无增量计数器）。
///
/// 每个分组对应一个首字母组合，只统计符合变体命名约定的文件。
pub fn collect(backend: &dyn VariantBackend) -> Result<StatsSnapshot, StoreError> {
    let mut groups = backend.list_groups()?;
    groups.sort();

    let mut snapshot = StatsSnapshot::default();
    for group in groups {
        // 扫描期间分组可能被并发创建/删除，缺失时按 0 计
        let files = match backend.list_files(&group) {
            Ok(files) => files.unwrap_or_default(),
            Err(StoreError::InvalidKey(_)) => {
                tracing::debug!("统计时跳过非法分组: {:?}", group);
                continue;
            }
            Err(e) => return Err(e),
        };
        let variants = files
            .iter()
            .filter(|f| parse_variant_number(&group, f).is_some())
            .count();

        snapshot.total_initials += 1;
        snapshot.total_variants += variants;
        snapshot.initials_generated.push(GroupCount {
            initials: group,
            variants,
        });
    }
    Ok(snapshot)
}
