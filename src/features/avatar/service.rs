use std::sync::Arc;
use tokio::sync::Semaphore;

use super::initials::Initials;
use super::store::{Variant, VariantStore};
use crate::error::{AppError, StoreError};

/// 头像服务：把同步的存储/渲染调用搬到阻塞线程池，并用信号量限制并发渲染数。
#[derive(Clone)]
pub struct AvatarService {
    store: Arc<VariantStore>,
    render_semaphore: Arc<Semaphore>,
}

impl AvatarService {
    pub fn new(store: Arc<VariantStore>, max_parallel: usize) -> Self {
        Self {
            store,
            render_semaphore: Arc::new(Semaphore::new(max_parallel.max(1))),
        }
    }

    pub fn store(&self) -> &Arc<VariantStore> {
        &self.store
    }

    /// 在渲染许可下执行一个可能触发渲染的阻塞操作
    async fn run_rendering<T, F>(&self, job: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(&VariantStore) -> Result<T, StoreError> + Send + 'static,
    {
        let _permit = self
            .render_semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AppError::Internal(format!("获取渲染信号量失败: {e}")))?;
        self.run_blocking(job).await
    }

    async fn run_blocking<T, F>(&self, job: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(&VariantStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || job(&store))
            .await
            .map_err(|e| AppError::Internal(format!("阻塞任务执行失败: {e}")))?
            .map_err(AppError::from)
    }

    pub async fn random_variant(&self, initials: Initials) -> Result<Variant, AppError> {
        self.run_rendering(move |store| store.get_random_variant(&initials))
            .await
    }

    pub async fn generate_variants(
        &self,
        initials: Initials,
        count: usize,
    ) -> Result<Vec<Variant>, AppError> {
        self.run_rendering(move |store| store.generate_variants(&initials, count))
            .await
    }

    /// 读取已存储的图片字节（纯 I/O，不占用渲染许可）
    pub async fn read_image(&self, initials: String, filename: String) -> Result<Vec<u8>, AppError> {
        self.run_blocking(move |store| store.read_variant(&initials, &filename))
            .await
    }
}
