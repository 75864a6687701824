use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::backend::{VariantBackend, is_safe_segment};
use super::initials::Initials;
use super::palette::{BACKGROUND_COLORS, MAX_VARIANTS};
use super::renderer::AvatarRenderer;
use crate::error::StoreError;

/// 分组为空时懒生成的变体数量
pub const DEFAULT_VARIANT_COUNT: usize = 3;
pub const IMAGE_EXTENSION: &str = "png";
pub const IMAGE_CONTENT_TYPE: &str = "image/png";

/// 一张已持久化的头像变体。
///
/// `bg_color` 只在刚生成时可知；从已有文件中挑选时文件名不携带颜色，因此为 `None`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct Variant {
    /// 组内序号（从 1 开始）
    #[schema(example = 2)]
    pub variant: u32,
    #[schema(example = "AS_variant2.png")]
    pub filename: String,
    /// 公开访问路径
    #[schema(example = "/image/AS/AS_variant2.png")]
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "#2980B9")]
    pub bg_color: Option<String>,
}

impl Variant {
    fn new(initials: &str, number: u32, bg_color: Option<&str>) -> Self {
        let filename = variant_filename(initials, number);
        Self {
            variant: number,
            url: image_url(initials, &filename),
            filename,
            bg_color: bg_color.map(str::to_string),
        }
    }
}

/// `{INITIALS}_variant{N}.png`
pub fn variant_filename(initials: &str, number: u32) -> String {
    format!("{initials}_variant{number}.{IMAGE_EXTENSION}")
}

pub fn image_url(initials: &str, filename: &str) -> String {
    format!("/image/{initials}/{filename}")
}

/// 从文件名中解析序号；不符合 `{group}_variant{N}.png` 命名约定时返回 `None`。
pub fn parse_variant_number(group: &str, filename: &str) -> Option<u32> {
    let n = filename
        .strip_prefix(group)?
        .strip_prefix("_variant")?
        .strip_suffix(IMAGE_EXTENSION)?
        .strip_suffix('.')?;
    if n.is_empty() || !n.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    n.parse::<u32>().ok().filter(|&v| v >= 1)
}

/// 头像变体仓库：负责生成、持久化与随机挑选。
///
/// 同一首字母的写入（显式生成与懒生成）通过分组锁串行化，
/// 读取不加锁，只保证最终一致的目录视图。
pub struct VariantStore {
    backend: Arc<dyn VariantBackend>,
    renderer: Arc<dyn AvatarRenderer>,
    group_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl VariantStore {
    pub fn new(backend: Arc<dyn VariantBackend>, renderer: Arc<dyn AvatarRenderer>) -> Self {
        Self {
            backend,
            renderer,
            group_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> &dyn VariantBackend {
        self.backend.as_ref()
    }

    fn lock_table(&self) -> Result<MutexGuard<'_, HashMap<String, Arc<Mutex<()>>>>, StoreError> {
        self.group_locks
            .lock()
            .map_err(|_| StoreError::Backend("分组锁表已中毒".to_string()))
    }

    /// 持有分组锁执行 `job`；结束后若无其他请求在等待该分组，则移除锁表条目。
    fn with_group_lock<T>(
        &self,
        group: &str,
        job: impl FnOnce() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let lock = self.lock_table()?.entry(group.to_string()).or_default().clone();
        let result = match lock.lock() {
            Ok(_guard) => job(),
            Err(_) => Err(StoreError::Backend("分组锁已中毒".to_string())),
        };
        drop(lock);

        // 克隆与检查都在锁表内完成，计数为 1 说明只剩锁表自身持有
        let mut locks = self.lock_table()?;
        if locks.get(group).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(group);
        }
        result
    }

    fn ensure_storable(initials: &Initials) -> Result<(), StoreError> {
        if is_safe_segment(initials.as_str()) {
            Ok(())
        } else {
            Err(StoreError::InvalidKey(initials.to_string()))
        }
    }

    /// 为首字母生成 `count` 个变体（1..=12），颜色从色板中无放回抽样。
    ///
    /// 序号 1..count 的文件被整体重写；此前生成的更大序号文件保持不变。
    pub fn generate_variants(
        &self,
        initials: &Initials,
        count: usize,
    ) -> Result<Vec<Variant>, StoreError> {
        if !(1..=MAX_VARIANTS).contains(&count) {
            return Err(StoreError::InvalidCount {
                count,
                max: MAX_VARIANTS,
            });
        }
        Self::ensure_storable(initials)?;

        self.with_group_lock(initials.as_str(), || self.generate_locked(initials, count))
    }

    fn generate_locked(&self, initials: &Initials, count: usize) -> Result<Vec<Variant>, StoreError> {
        let colors: Vec<&'static str> = {
            let mut rng = rand::thread_rng();
            BACKGROUND_COLORS
                .choose_multiple(&mut rng, count.min(BACKGROUND_COLORS.len()))
                .copied()
                .collect()
        };

        let group = initials.as_str();
        let mut variants = Vec::with_capacity(colors.len());
        for (number, color) in (1u32..).zip(colors) {
            let bytes = self.renderer.render(initials, color)?;
            let variant = Variant::new(group, number, Some(color));
            self.backend.write(group, &variant.filename, &bytes)?;
            variants.push(variant);
        }

        tracing::debug!("已为 {} 生成 {} 个变体", group, variants.len());
        Ok(variants)
    }

    /// 组内符合命名约定的已有变体（序号, 文件名）
    fn existing_variants(&self, group: &str) -> Result<Vec<(u32, String)>, StoreError> {
        let files = self.backend.list_files(group)?.unwrap_or_default();
        Ok(files
            .into_iter()
            .filter_map(|f| parse_variant_number(group, &f).map(|n| (n, f)))
            .collect())
    }

    fn pick_existing(&self, group: &str) -> Result<Option<Variant>, StoreError> {
        let existing = self.existing_variants(group)?;
        let mut rng = rand::thread_rng();
        Ok(existing.choose(&mut rng).map(|(number, filename)| Variant {
            variant: *number,
            filename: filename.clone(),
            url: image_url(group, filename),
            bg_color: None,
        }))
    }

    /// 随机返回一个已有变体；分组不存在或为空时先生成默认数量的变体再从中挑选。
    pub fn get_random_variant(&self, initials: &Initials) -> Result<Variant, StoreError> {
        Self::ensure_storable(initials)?;
        let group = initials.as_str();

        if let Some(v) = self.pick_existing(group)? {
            return Ok(v);
        }

        self.with_group_lock(group, || {
            // 等锁期间其他请求可能已经生成完毕
            if let Some(v) = self.pick_existing(group)? {
                return Ok(v);
            }

            let generated = self.generate_locked(initials, DEFAULT_VARIANT_COUNT)?;
            let mut rng = rand::thread_rng();
            generated
                .choose(&mut rng)
                .cloned()
                .ok_or_else(|| StoreError::Backend(format!("{group} 生成结果为空")))
        })
    }

    /// 按 URL 中的路径段读取变体字节；路径段非法或文件不存在时返回 `NotFound`。
    pub fn read_variant(&self, initials: &str, filename: &str) -> Result<Vec<u8>, StoreError> {
        let not_found = || StoreError::NotFound(format!("{initials}/{filename}"));
        if !is_safe_segment(initials) || !is_safe_segment(filename) {
            return Err(not_found());
        }
        self.backend.read(initials, filename)?.ok_or_else(not_found)
    }
}
