//! 本地文件存储适配器
//!
//! A key-value store with one JSON file per key under the data directory.
//! Every mutation is a read-modify-write of the whole key, serialized by a
//! single lock and committed with a rename.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use cloudkeeper_core::error::{CoreError, CoreResult};
use cloudkeeper_core::traits::{AuditLogStore, DomainRepository, SessionStore};
use cloudkeeper_core::types::{
    prepend_bounded, AuditLogEntry, BatchUpdateItem, DomainRecord, DomainRecordUpdate,
    StorageConfig,
};

/// Tracked domain records (newest first).
pub const APPS_KEY: &str = "cloudkeeper_apps";
/// Storage backend selection.
pub const CONFIG_KEY: &str = "cloudkeeper_config_v2";
/// Bounded audit log buffer.
pub const AUDIT_LOGS_KEY: &str = "cloudkeeper_audit_logs";
/// Login flag.
pub const SESSION_KEY: &str = "cloudkeeper_auth_session";

/// 本地 JSON 存储
pub struct LocalStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// 读取键值，文件不存在时返回 None
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CoreResult<Option<T>> {
        let path = self.path_for(key);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CoreError::StorageError(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )))
            }
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| CoreError::SerializationError(format!("{key}: {e}")))
    }

    /// 写入键值（先写临时文件再重命名）
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> CoreResult<()> {
        let body = serde_json::to_vec_pretty(value)
            .map_err(|e| CoreError::SerializationError(format!("{key}: {e}")))?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            CoreError::StorageError(format!("Failed to create {}: {e}", self.dir.display()))
        })?;

        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            CoreError::StorageError(format!("Failed to replace {}: {e}", path.display()))
        })?;
        Ok(())
    }

    /// Read, transform and write back one key under the write lock.
    async fn modify<T, F>(&self, key: &str, f: F) -> CoreResult<()>
    where
        T: Serialize + DeserializeOwned + Default + Send,
        F: FnOnce(&mut T) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut value: T = self.get(key).await?.unwrap_or_default();
        f(&mut value);
        self.set(key, &value).await
    }

    // ===== 存储配置 =====

    pub async fn load_storage_config(&self) -> CoreResult<Option<StorageConfig>> {
        self.get(CONFIG_KEY).await
    }

    pub async fn save_storage_config(&self, config: &StorageConfig) -> CoreResult<()> {
        let _guard = self.write_lock.lock().await;
        self.set(CONFIG_KEY, config).await
    }
}

#[async_trait]
impl DomainRepository for LocalStore {
    async fn list(&self) -> CoreResult<Vec<DomainRecord>> {
        Ok(self.get(APPS_KEY).await?.unwrap_or_default())
    }

    async fn add(&self, record: &DomainRecord) -> CoreResult<()> {
        let record = record.clone();
        self.modify(APPS_KEY, move |records: &mut Vec<DomainRecord>| {
            records.insert(0, record);
        })
        .await
    }

    async fn update(&self, id: &str, update: &DomainRecordUpdate) -> CoreResult<()> {
        self.modify(APPS_KEY, |records: &mut Vec<DomainRecord>| {
            if let Some(record) = records.iter_mut().find(|r| r.id == id) {
                update.apply_to(record);
            }
        })
        .await
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        self.modify(APPS_KEY, |records: &mut Vec<DomainRecord>| {
            records.retain(|r| r.id != id);
        })
        .await
    }

    async fn batch_update(&self, items: &[BatchUpdateItem]) -> CoreResult<()> {
        if items.is_empty() {
            return Ok(());
        }
        self.modify(APPS_KEY, |records: &mut Vec<DomainRecord>| {
            for item in items {
                if let Some(record) = records.iter_mut().find(|r| r.id == item.id) {
                    item.update.apply_to(record);
                }
            }
        })
        .await
    }

    async fn import(&self, incoming: &[DomainRecord]) -> CoreResult<()> {
        if incoming.is_empty() {
            return Ok(());
        }
        self.modify(APPS_KEY, |records: &mut Vec<DomainRecord>| {
            for record in incoming {
                match records.iter_mut().find(|r| r.id == record.id) {
                    Some(existing) => *existing = record.clone(),
                    None => records.push(record.clone()),
                }
            }
        })
        .await
    }
}

#[async_trait]
impl AuditLogStore for LocalStore {
    async fn append(&self, entry: &AuditLogEntry) -> CoreResult<()> {
        let entry = entry.clone();
        self.modify(AUDIT_LOGS_KEY, move |entries: &mut Vec<AuditLogEntry>| {
            prepend_bounded(entries, entry);
        })
        .await
    }

    async fn recent(&self, limit: usize) -> CoreResult<Vec<AuditLogEntry>> {
        let mut entries: Vec<AuditLogEntry> = self.get(AUDIT_LOGS_KEY).await?.unwrap_or_default();
        entries.truncate(limit);
        Ok(entries)
    }

    async fn clear(&self) -> CoreResult<()> {
        let _guard = self.write_lock.lock().await;
        self.set(AUDIT_LOGS_KEY, &Vec::<AuditLogEntry>::new()).await
    }
}

#[async_trait]
impl SessionStore for LocalStore {
    async fn is_authenticated(&self) -> CoreResult<bool> {
        Ok(self.get(SESSION_KEY).await?.unwrap_or(false))
    }

    async fn set_authenticated(&self, authenticated: bool) -> CoreResult<()> {
        let _guard = self.write_lock.lock().await;
        self.set(SESSION_KEY, &authenticated).await
    }
}
