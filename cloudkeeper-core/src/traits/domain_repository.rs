//! 域名记录持久化抽象 Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{BatchUpdateItem, DomainRecord, DomainRecordUpdate};

/// 域名记录仓库 Trait
///
/// 平台实现:
/// - Local: `LocalStore` (JSON key file under the data directory)
/// - Remote: `RemoteTable` (PostgREST `domains` table, wrapped in retry)
/// - `StorageRouter` dispatches to one of the above per call
#[async_trait]
pub trait DomainRepository: Send + Sync {
    /// 获取全部记录（本地存储中为最新优先）
    async fn list(&self) -> CoreResult<Vec<DomainRecord>>;

    /// 新增记录
    ///
    /// # Errors
    /// * `UniqueViolation` - 该 id 已存在（仅远程）
    async fn add(&self, record: &DomainRecord) -> CoreResult<()>;

    /// 部分更新（浅合并）
    ///
    /// # Note
    /// 未知 id 为 no-op
    async fn update(&self, id: &str, update: &DomainRecordUpdate) -> CoreResult<()>;

    /// 删除记录
    async fn delete(&self, id: &str) -> CoreResult<()>;

    /// 批量更新（状态巡检使用，一次调用覆盖所有 id）
    async fn batch_update(&self, items: &[BatchUpdateItem]) -> CoreResult<()>;

    /// 按 id upsert；空列表为 no-op
    async fn import(&self, records: &[DomainRecord]) -> CoreResult<()>;
}
