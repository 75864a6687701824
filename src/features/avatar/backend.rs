use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use uuid::Uuid;

use crate::error::StoreError;

/// 变体存储后端：按分组（首字母）组织的扁平文件集合。
///
/// 所有方法都是同步阻塞的，调用方负责把它们放到阻塞线程池中执行。
pub trait VariantBackend: Send + Sync {
    /// 列出全部分组名
    fn list_groups(&self) -> Result<Vec<String>, StoreError>;

    /// 列出分组内的文件名；分组不存在时返回 `None`
    fn list_files(&self, group: &str) -> Result<Option<Vec<String>>, StoreError>;

    /// 写入文件（分组不存在时自动创建），同名文件整体替换
    fn write(&self, group: &str, filename: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// 读取文件；不存在时返回 `None`
    fn read(&self, group: &str, filename: &str) -> Result<Option<Vec<u8>>, StoreError>;
}

/// 判断一个名字能否作为单段路径使用（不含分隔符、不是 `.`/`..`、无控制字符）。
pub fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':') || c.is_control())
}

fn ensure_safe(segment: &str) -> Result<(), StoreError> {
    if is_safe_segment(segment) {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(segment.to_string()))
    }
}

/// 目录布局后端：`{root}/{INITIALS}/{INITIALS}_variant{N}.png`
#[derive(Debug)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    /// 打开（必要时创建）存储根目录
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let root = fs::canonicalize(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn group_dir(&self, group: &str) -> Result<PathBuf, StoreError> {
        ensure_safe(group)?;
        Ok(self.root.join(group))
    }
}

impl VariantBackend for FsBackend {
    fn list_groups(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut groups = Vec::new();
        for entry in entries.flatten() {
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) if is_safe_segment(&name) => groups.push(name),
                Ok(name) => tracing::debug!("跳过无法作为分组名的目录: {:?}", name),
                Err(raw) => tracing::debug!("跳过非 UTF-8 分组目录: {:?}", raw),
            }
        }
        Ok(groups)
    }

    fn list_files(&self, group: &str) -> Result<Option<Vec<String>>, StoreError> {
        let dir = self.group_dir(group)?;
        if !dir.is_dir() {
            return Ok(None);
        }
        let entries = match fs::read_dir(&dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let files = entries
            .flatten()
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        Ok(Some(files))
    }

    fn write(&self, group: &str, filename: &str, bytes: &[u8]) -> Result<(), StoreError> {
        ensure_safe(filename)?;
        let dir = self.group_dir(group)?;
        fs::create_dir_all(&dir)?;

        // 先写临时文件再 rename，读者永远看不到半截文件
        let tmp = dir.join(format!(".{filename}.{}.tmp", Uuid::new_v4().simple()));
        fs::write(&tmp, bytes)?;
        if let Err(e) = fs::rename(&tmp, dir.join(filename)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn read(&self, group: &str, filename: &str) -> Result<Option<Vec<u8>>, StoreError> {
        ensure_safe(filename)?;
        let path = self.group_dir(group)?.join(filename);

        let real = match fs::canonicalize(&path) {
            Ok(p) => p,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        // 软链接等可能把路径解析到根目录之外
        if !real.starts_with(&self.root) {
            tracing::warn!("拒绝访问存储根目录之外的路径: {}", real.display());
            return Ok(None);
        }
        if !real.is_file() {
            return Ok(None);
        }
        Ok(Some(fs::read(real)?))
    }
}

/// 内存后端：用于测试与无需持久化的部署。
#[derive(Debug, Default)]
pub struct MemoryBackend {
    groups: RwLock<BTreeMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("内存存储锁已中毒".to_string())
}

impl VariantBackend for MemoryBackend {
    fn list_groups(&self) -> Result<Vec<String>, StoreError> {
        let groups = self.groups.read().map_err(|_| poisoned())?;
        Ok(groups.keys().cloned().collect())
    }

    fn list_files(&self, group: &str) -> Result<Option<Vec<String>>, StoreError> {
        ensure_safe(group)?;
        let groups = self.groups.read().map_err(|_| poisoned())?;
        Ok(groups.get(group).map(|files| files.keys().cloned().collect()))
    }

    fn write(&self, group: &str, filename: &str, bytes: &[u8]) -> Result<(), StoreError> {
        ensure_safe(group)?;
        ensure_safe(filename)?;
        let mut groups = self.groups.write().map_err(|_| poisoned())?;
        groups
            .entry(group.to_string())
            .or_default()
            .insert(filename.to_string(), bytes.to_vec());
        Ok(())
    }

    fn read(&self, group: &str, filename: &str) -> Result<Option<Vec<u8>>, StoreError> {
        ensure_safe(group)?;
        ensure_safe(filename)?;
        let groups = self.groups.read().map_err(|_| poisoned())?;
        Ok(groups.get(group).and_then(|files| files.get(filename)).cloned())
    }
}
