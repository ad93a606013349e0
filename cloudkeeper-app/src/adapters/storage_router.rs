//! Storage backend routing
//!
//! Holds the current [`StorageConfig`] and a lazily built [`RemoteTable`].
//! Each call resolves the backend; the cached client is dropped when the
//! config changes or the remote reports a missing table.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use cloudkeeper_core::error::{CoreError, CoreResult};
use cloudkeeper_core::traits::{AuditLogStore, DomainRepository, LoginDirectory};
use cloudkeeper_core::types::{
    AuditLogEntry, BatchUpdateItem, DomainRecord, DomainRecordUpdate, StorageConfig, StorageKind,
};
use cloudkeeper_core::utils::RetryPolicy;

use super::local_store::LocalStore;
use super::remote_table::RemoteTable;

/// Environment variable naming the default remote URL.
pub const REMOTE_URL_ENV: &str = "CLOUDKEEPER_REMOTE_URL";
/// Environment variable naming the default remote key.
pub const REMOTE_KEY_ENV: &str = "CLOUDKEEPER_REMOTE_KEY";

/// Config used when none has been saved: remote when both values are set.
#[must_use]
pub fn default_storage_config(url: Option<String>, key: Option<String>) -> StorageConfig {
    match (url, key) {
        (Some(url), Some(key)) if !url.trim().is_empty() && !key.trim().is_empty() => {
            StorageConfig::remote(url, key)
        }
        _ => StorageConfig::local(),
    }
}

fn env_storage_config() -> StorageConfig {
    default_storage_config(
        std::env::var(REMOTE_URL_ENV).ok(),
        std::env::var(REMOTE_KEY_ENV).ok(),
    )
}

/// 存储路由
pub struct StorageRouter {
    local: Arc<LocalStore>,
    config: RwLock<Option<StorageConfig>>,
    remote: RwLock<Option<Arc<RemoteTable>>>,
    retry: RetryPolicy,
}

impl StorageRouter {
    #[must_use]
    pub fn new(local: Arc<LocalStore>) -> Self {
        Self {
            local,
            config: RwLock::new(None),
            remote: RwLock::new(None),
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Current config; read from the local store on first use.
    pub async fn config(&self) -> CoreResult<StorageConfig> {
        if let Some(config) = self.config.read().await.as_ref() {
            return Ok(config.clone());
        }

        let config = match self.local.load_storage_config().await {
            Ok(Some(config)) => config,
            Ok(None) => env_storage_config(),
            Err(e) => {
                log::warn!("Unreadable storage config, using defaults: {e}");
                env_storage_config()
            }
        };
        *self.config.write().await = Some(config.clone());
        Ok(config)
    }

    /// Persist a new config and drop the cached remote client.
    pub async fn save_config(&self, config: &StorageConfig) -> CoreResult<()> {
        self.local.save_storage_config(config).await?;
        *self.config.write().await = Some(config.clone());
        self.reset().await;
        log::info!("Storage backend set to {:?}", config.kind);
        Ok(())
    }

    /// 清除缓存的远程客户端
    pub async fn reset(&self) {
        *self.remote.write().await = None;
    }

    /// `None` in local mode.
    async fn remote(&self) -> CoreResult<Option<Arc<RemoteTable>>> {
        let config = self.config().await?;
        if config.kind == StorageKind::Local {
            return Ok(None);
        }
        if let Some(remote) = self.remote.read().await.as_ref() {
            return Ok(Some(Arc::clone(remote)));
        }

        let (url, key) = config
            .remote_credentials()
            .ok_or(CoreError::RemoteNotConfigured)?;
        let remote = Arc::new(RemoteTable::new(url, key)?.with_retry_policy(self.retry));
        *self.remote.write().await = Some(Arc::clone(&remote));
        log::debug!("Remote client initialized for {url}");
        Ok(Some(remote))
    }

    /// Remote client or `RemoteNotConfigured`.
    async fn require_remote(&self) -> CoreResult<Arc<RemoteTable>> {
        self.remote().await?.ok_or(CoreError::RemoteNotConfigured)
    }

    async fn observe<T>(&self, result: CoreResult<T>) -> CoreResult<T> {
        if let Err(CoreError::TableMissing { table }) = &result {
            log::warn!("Remote table '{table}' missing, resetting client");
            self.reset().await;
        }
        result
    }
}

#[async_trait]
impl DomainRepository for StorageRouter {
    async fn list(&self) -> CoreResult<Vec<DomainRecord>> {
        match self.remote().await? {
            Some(remote) => self.observe(remote.list().await).await,
            None => self.local.list().await,
        }
    }

    async fn add(&self, record: &DomainRecord) -> CoreResult<()> {
        match self.remote().await? {
            Some(remote) => self.observe(remote.add(record).await).await,
            None => self.local.add(record).await,
        }
    }

    async fn update(&self, id: &str, update: &DomainRecordUpdate) -> CoreResult<()> {
        match self.remote().await? {
            Some(remote) => self.observe(remote.update(id, update).await).await,
            None => self.local.update(id, update).await,
        }
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        match self.remote().await? {
            Some(remote) => self.observe(remote.delete(id).await).await,
            None => self.local.delete(id).await,
        }
    }

    async fn batch_update(&self, items: &[BatchUpdateItem]) -> CoreResult<()> {
        match self.remote().await? {
            Some(remote) => self.observe(remote.batch_update(items).await).await,
            None => self.local.batch_update(items).await,
        }
    }

    async fn import(&self, records: &[DomainRecord]) -> CoreResult<()> {
        match self.remote().await? {
            Some(remote) => self.observe(remote.import(records).await).await,
            None => self.local.import(records).await,
        }
    }
}

#[async_trait]
impl LoginDirectory for StorageRouter {
    async fn verify(&self, username: &str, password: &str) -> CoreResult<bool> {
        let remote = self.require_remote().await?;
        self.observe(remote.verify(username, password).await).await
    }
}

/// Remote side of the audit log, routed through the current config.
pub struct RemoteAuditLog {
    router: Arc<StorageRouter>,
}

impl RemoteAuditLog {
    #[must_use]
    pub fn new(router: Arc<StorageRouter>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl AuditLogStore for RemoteAuditLog {
    async fn append(&self, entry: &AuditLogEntry) -> CoreResult<()> {
        let remote = self.router.require_remote().await?;
        self.router.observe(remote.append(entry).await).await
    }

    async fn recent(&self, limit: usize) -> CoreResult<Vec<AuditLogEntry>> {
        let remote = self.router.require_remote().await?;
        self.router.observe(remote.recent(limit).await).await
    }

    async fn clear(&self) -> CoreResult<()> {
        self.router.require_remote().await?.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::default_storage_config;
    use cloudkeeper_core::types::StorageKind;

    #[test]
    fn env_default_needs_both_values() {
        assert_eq!(
            default_storage_config(Some("https://x".into()), Some("k".into())).kind,
            StorageKind::Remote
        );
        assert_eq!(
            default_storage_config(Some("https://x".into()), None).kind,
            StorageKind::Local
        );
        assert_eq!(
            default_storage_config(Some(String::new()), Some("k".into())).kind,
            StorageKind::Local
        );
    }
}
