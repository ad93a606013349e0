//! Audit logging service
//!
//! Every entry is emitted to the `log` facade immediately and then persisted
//! by a background task: remote table first, bounded local buffer on any
//! remote failure. Callers never wait and never see an error; short-lived
//! frontends call [`AuditService::flush`] before exiting.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{json, Value};
use tokio::task::JoinSet;

use crate::error::{CoreError, CoreResult};
use crate::traits::AuditLogStore;
use crate::types::{AuditLevel, AuditLogEntry, AUDIT_LOG_CAPACITY};
use crate::utils::datetime;

/// 审计日志服务
#[derive(Clone)]
pub struct AuditService {
    remote: Arc<dyn AuditLogStore>,
    local: Arc<dyn AuditLogStore>,
    pending: Arc<Mutex<JoinSet<()>>>,
}

impl AuditService {
    #[must_use]
    pub fn new(remote: Arc<dyn AuditLogStore>, local: Arc<dyn AuditLogStore>) -> Self {
        Self {
            remote,
            local,
            pending: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    fn pending(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Record an entry. Returns the entry that will be persisted.
    pub fn log(
        &self,
        level: AuditLevel,
        action: impl Into<String>,
        details: Option<Value>,
    ) -> AuditLogEntry {
        let entry = AuditLogEntry::new(level, action, details);
        emit(&entry);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let service = self.clone();
                let pending = entry.clone();
                let mut tasks = self.pending();
                while tasks.try_join_next().is_some() {}
                tasks.spawn_on(async move { service.persist(&pending).await }, &handle);
            }
            Err(_) => log::warn!("No async runtime, audit entry '{}' not persisted", entry.action),
        }

        entry
    }

    pub fn info(&self, action: impl Into<String>, details: Option<Value>) -> AuditLogEntry {
        self.log(AuditLevel::Info, action, details)
    }

    pub fn warn(&self, action: impl Into<String>, details: Option<Value>) -> AuditLogEntry {
        self.log(AuditLevel::Warn, action, details)
    }

    /// Errors are recorded as `{ "message": ... }`.
    pub fn error(&self, action: impl Into<String>, err: &CoreError) -> AuditLogEntry {
        self.log(
            AuditLevel::Error,
            action,
            Some(json!({ "message": err.to_string() })),
        )
    }

    /// 持久化单条日志（远程优先，失败回退本地）
    pub async fn persist(&self, entry: &AuditLogEntry) {
        let remote_err = match self.remote.append(entry).await {
            Ok(()) => return,
            Err(e) => e,
        };
        if !matches!(remote_err, CoreError::RemoteNotConfigured) {
            log::debug!("Remote audit write failed, using local buffer: {remote_err}");
        }
        if let Err(e) = self.local.append(entry).await {
            log::error!("Failed to persist audit entry '{}': {e}", entry.action);
        }
    }

    /// Wait until every entry logged so far has been persisted.
    ///
    /// Entries logged while flushing are awaited too.
    pub async fn flush(&self) {
        loop {
            let mut tasks = std::mem::take(&mut *self.pending());
            if tasks.is_empty() {
                return;
            }
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    log::error!("Audit persist task failed: {e}");
                }
            }
        }
    }

    /// 读取日志：远程优先，任何远程错误时读取本地
    pub async fn logs(&self) -> Vec<AuditLogEntry> {
        match self.remote.recent(AUDIT_LOG_CAPACITY).await {
            Ok(entries) => return entries,
            Err(CoreError::RemoteNotConfigured) => {}
            Err(e) => log::debug!("Remote audit read failed, reading local buffer: {e}"),
        }
        match self.local.recent(AUDIT_LOG_CAPACITY).await {
            Ok(entries) => entries,
            Err(e) => {
                log::error!("Failed to read local audit log: {e}");
                Vec::new()
            }
        }
    }

    /// Write all entries as pretty JSON to
    /// `dir/cloudkeeper-audit-log-YYYY-MM-DD.json`.
    pub async fn export_logs(&self, dir: &Path) -> CoreResult<PathBuf> {
        let entries = self.logs().await;
        let path = dir.join(format!(
            "cloudkeeper-audit-log-{}.json",
            datetime::date_stamp()
        ));
        let body = serde_json::to_string_pretty(&entries)
            .map_err(|e| CoreError::SerializationError(e.to_string()))?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| CoreError::StorageError(format!("{}: {e}", path.display())))?;
        log::info!("Exported {} audit entries to {}", entries.len(), path.display());
        Ok(path)
    }

    pub async fn clear_local_logs(&self) -> CoreResult<()> {
        self.local.clear().await
    }
}

fn emit(entry: &AuditLogEntry) {
    let details = entry
        .details
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    match entry.level {
        AuditLevel::Error => log::error!("[AUDIT] {} {details}", entry.action),
        AuditLevel::Warn => log::warn!("[AUDIT] {} {details}", entry.action),
        AuditLevel::Info => log::info!("[AUDIT] {} {details}", entry.action),
    }
}
