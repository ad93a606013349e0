//! 测试辅助模块
//!
//! 提供 mock 实现和便捷的测试工厂方法。

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use cloudkeeper_toolbox::hostname_of;
use tokio::sync::{RwLock, Semaphore};

use crate::error::{CoreError, CoreResult};
use crate::traits::{
    AuditLogStore, DomainInspector, DomainRepository, LoginDirectory, SessionStore,
};
use crate::types::{
    prepend_bounded, AiMetadata, AuditLogEntry, BatchUpdateItem, DomainRecord,
    DomainRecordUpdate, DomainStatus, NetworkInfo,
};

pub fn test_record(id: &str, url: &str) -> DomainRecord {
    DomainRecord {
        id: id.to_string(),
        url: url.to_string(),
        name: hostname_of(url).unwrap_or_default(),
        status: DomainStatus::Unknown,
        last_checked: 0,
        favicon: None,
        owner: None,
        description: None,
        registrar: None,
        registrar_url: None,
        registration_date: None,
        expires_at: None,
        ip_address: None,
        location: None,
        isp: None,
        nameservers: None,
        dns_records: None,
    }
}

// ===== MockDomainRepository =====

pub struct MockDomainRepository {
    records: RwLock<Vec<DomainRecord>>,
    batch_calls: RwLock<Vec<Vec<String>>>,
    /// 如果 Some，下一次 add 返回此错误
    add_error: RwLock<Option<CoreError>>,
}

impl MockDomainRepository {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            batch_calls: RwLock::new(Vec::new()),
            add_error: RwLock::new(None),
        }
    }

    pub async fn seed(&self, records: Vec<DomainRecord>) {
        *self.records.write().await = records;
    }

    pub async fn records(&self) -> Vec<DomainRecord> {
        self.records.read().await.clone()
    }

    /// Ids covered by each `batch_update` call.
    pub async fn batch_calls(&self) -> Vec<Vec<String>> {
        self.batch_calls.read().await.clone()
    }

    pub async fn fail_next_add(&self, err: CoreError) {
        *self.add_error.write().await = Some(err);
    }
}

#[async_trait]
impl DomainRepository for MockDomainRepository {
    async fn list(&self) -> CoreResult<Vec<DomainRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn add(&self, record: &DomainRecord) -> CoreResult<()> {
        if let Some(err) = self.add_error.write().await.take() {
            return Err(err);
        }
        self.records.write().await.insert(0, record.clone());
        Ok(())
    }

    async fn update(&self, id: &str, update: &DomainRecordUpdate) -> CoreResult<()> {
        if let Some(record) = self.records.write().await.iter_mut().find(|r| r.id == id) {
            update.apply_to(record);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        self.records.write().await.retain(|r| r.id != id);
        Ok(())
    }

    async fn batch_update(&self, items: &[BatchUpdateItem]) -> CoreResult<()> {
        self.batch_calls
            .write()
            .await
            .push(items.iter().map(|i| i.id.clone()).collect());
        for item in items {
            self.update(&item.id, &item.update).await?;
        }
        Ok(())
    }

    async fn import(&self, records: &[DomainRecord]) -> CoreResult<()> {
        let mut store = self.records.write().await;
        for record in records {
            match store.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => store.push(record.clone()),
            }
        }
        Ok(())
    }
}

// ===== MockInspector =====

/// Every URL is online unless overridden.
pub struct MockInspector {
    statuses: RwLock<HashMap<String, DomainStatus>>,
    status_calls: RwLock<usize>,
    /// 如果 Some，每次探测需要先获得一个许可
    gate: Option<Semaphore>,
}

impl MockInspector {
    pub fn new() -> Self {
        Self {
            statuses: RwLock::new(HashMap::new()),
            status_calls: RwLock::new(0),
            gate: None,
        }
    }

    /// Probes block until [`MockInspector::release`] hands out permits.
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    /// Let `count` blocked probes finish.
    pub fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    pub async fn set_status(&self, url: &str, status: DomainStatus) {
        self.statuses.write().await.insert(url.to_string(), status);
    }

    pub async fn status_calls(&self) -> usize {
        *self.status_calls.read().await
    }
}

#[async_trait]
impl DomainInspector for MockInspector {
    async fn check_status(&self, url: &str) -> DomainStatus {
        *self.status_calls.write().await += 1;
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.statuses
            .read()
            .await
            .get(url)
            .copied()
            .unwrap_or(DomainStatus::Online)
    }

    async fn network_details(&self, _url: &str) -> NetworkInfo {
        NetworkInfo {
            ip_address: Some("192.0.2.1".to_string()),
            registrar: Some("Mock Registrar".to_string()),
            ..NetworkInfo::default()
        }
    }

    async fn ai_metadata(&self, url: &str) -> AiMetadata {
        AiMetadata::fallback(&hostname_of(url).unwrap_or_default())
    }
}

// ===== MockAuditStore =====

pub struct MockAuditStore {
    entries: RwLock<Vec<AuditLogEntry>>,
    error: Option<CoreError>,
    delay: Option<Duration>,
}

impl MockAuditStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            error: None,
            delay: None,
        }
    }

    /// Store whose every call fails with `err`.
    pub fn failing(err: CoreError) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            error: Some(err),
            delay: None,
        }
    }

    /// Every append sleeps for `delay` first.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.read().await.clone()
    }

    fn check(&self) -> CoreResult<()> {
        self.error.clone().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl AuditLogStore for MockAuditStore {
    async fn append(&self, entry: &AuditLogEntry) -> CoreResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.check()?;
        prepend_bounded(&mut *self.entries.write().await, entry.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> CoreResult<Vec<AuditLogEntry>> {
        self.check()?;
        Ok(self.entries.read().await.iter().take(limit).cloned().collect())
    }

    async fn clear(&self) -> CoreResult<()> {
        self.check()?;
        self.entries.write().await.clear();
        Ok(())
    }
}

// ===== MockLoginDirectory =====

pub struct MockLoginDirectory {
    logins: Vec<(String, String)>,
    error: Option<CoreError>,
}

impl MockLoginDirectory {
    pub fn with_login(username: &str, password: &str) -> Self {
        Self {
            logins: vec![(username.to_string(), password.to_string())],
            error: None,
        }
    }

    pub fn failing(err: CoreError) -> Self {
        Self {
            logins: Vec::new(),
            error: Some(err),
        }
    }
}

#[async_trait]
impl LoginDirectory for MockLoginDirectory {
    async fn verify(&self, username: &str, password: &str) -> CoreResult<bool> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        Ok(self
            .logins
            .iter()
            .any(|(u, p)| u == username && p == password))
    }
}

// ===== MockSessionStore =====

pub struct MockSessionStore {
    authenticated: RwLock<bool>,
}

impl MockSessionStore {
    pub fn new() -> Self {
        Self {
            authenticated: RwLock::new(false),
        }
    }
}

#[async_trait]
impl SessionStore for MockSessionStore {
    async fn is_authenticated(&self) -> CoreResult<bool> {
        Ok(*self.authenticated.read().await)
    }

    async fn set_authenticated(&self, authenticated: bool) -> CoreResult<()> {
        *self.authenticated.write().await = authenticated;
        Ok(())
    }
}
