//! Application state controller
//!
//! Owns the authoritative in-memory list of records and keeps it in step
//! with the repository. Writes are optimistic: memory changes first, the
//! store follows. The lock is never held across a network call.

use std::sync::Arc;

use cloudkeeper_toolbox::hostname_of;
use futures::future::join_all;
use serde_json::json;
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::services::AuditService;
use crate::traits::{ConfirmPrompt, DomainInspector, DomainRepository};
use crate::types::{
    BatchUpdateItem, DomainRecord, DomainRecordUpdate, DomainStatus, SweepReport,
};
use crate::utils::datetime;

/// 域名状态控制器
pub struct DomainController {
    repository: Arc<dyn DomainRepository>,
    inspector: Arc<dyn DomainInspector>,
    audit: AuditService,
    records: RwLock<Vec<DomainRecord>>,
    selected: RwLock<Option<String>>,
}

impl DomainController {
    #[must_use]
    pub fn new(
        repository: Arc<dyn DomainRepository>,
        inspector: Arc<dyn DomainInspector>,
        audit: AuditService,
    ) -> Self {
        Self {
            repository,
            inspector,
            audit,
            records: RwLock::new(Vec::new()),
            selected: RwLock::new(None),
        }
    }

    /// Replace the in-memory list with the repository contents.
    pub async fn load(&self) -> CoreResult<usize> {
        let records = self.repository.list().await?;
        let count = records.len();
        *self.records.write().await = records;
        log::debug!("Loaded {count} records");
        Ok(count)
    }

    // ===== 查询 =====

    pub async fn records(&self) -> Vec<DomainRecord> {
        self.records.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<DomainRecord> {
        self.records.read().await.iter().find(|r| r.id == id).cloned()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Records whose name or URL contains `query` (case-insensitive).
    pub async fn filter(&self, query: &str) -> Vec<DomainRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.matches(query))
            .cloned()
            .collect()
    }

    /// Select a record by id, or clear the selection with `None`.
    pub async fn select(&self, id: Option<&str>) -> CoreResult<()> {
        if let Some(id) = id {
            if self.get(id).await.is_none() {
                return Err(CoreError::DomainNotFound(id.to_string()));
            }
        }
        *self.selected.write().await = id.map(ToString::to_string);
        Ok(())
    }

    pub async fn selected(&self) -> Option<DomainRecord> {
        let id = self.selected.read().await.clone()?;
        self.get(&id).await
    }

    // ===== 添加 =====

    /// Add a domain: provisional insert, persist, enrich, authoritative merge.
    pub async fn add_domain(&self, input: &str) -> CoreResult<DomainRecord> {
        let provisional = self.begin_add(input).await?;
        Ok(self.complete_add(provisional).await)
    }

    /// Phase 1: insert a placeholder record at the front and persist it.
    ///
    /// On persistence failure the placeholder is removed again.
    pub async fn begin_add(&self, input: &str) -> CoreResult<DomainRecord> {
        let (url, hostname) = normalize_url(input)?;
        let record = DomainRecord::provisional(
            uuid::Uuid::new_v4().to_string(),
            url.clone(),
            hostname,
            self.inspector.favicon(&url),
            datetime::now_millis(),
        );

        self.records.write().await.insert(0, record.clone());

        if let Err(e) = self.repository.add(&record).await {
            self.records.write().await.retain(|r| r.id != record.id);
            self.audit.error("Add Domain Failed", &e);
            return Err(e);
        }

        Ok(record)
    }

    /// Phase 2: fetch enrichment, probe, and merge the result everywhere.
    ///
    /// A failed store write is audited; memory still reflects the result.
    pub async fn complete_add(&self, provisional: DomainRecord) -> DomainRecord {
        let url = provisional.url.clone();
        let (metadata, network) = futures::join!(
            self.inspector.ai_metadata(&url),
            self.inspector.network_details(&url),
        );
        let status = self.inspector.check_status(&url).await;

        let update =
            DomainRecordUpdate::enrichment(metadata, network, status, datetime::now_millis());

        if let Err(e) = self.repository.update(&provisional.id, &update).await {
            log::warn!("Persisting enrichment for {} failed: {e}", provisional.id);
            self.audit.error("Domain Enrichment Persist Failed", &e);
        }

        let merged = match self.merge(&provisional.id, &update).await {
            Some(record) => record,
            // removed concurrently
            None => {
                let mut record = provisional;
                update.apply_to(&mut record);
                record
            }
        };

        self.audit.info(
            "Domain Added",
            Some(json!({ "id": merged.id, "url": merged.url, "name": merged.name })),
        );
        merged
    }

    // ===== 刷新 / 编辑 =====

    /// Probe a single record now.
    pub async fn refresh(&self, id: &str) -> CoreResult<DomainStatus> {
        let url = {
            let mut records = self.records.write().await;
            let record = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| CoreError::DomainNotFound(id.to_string()))?;
            record.status = DomainStatus::Checking;
            record.url.clone()
        };

        let status = self.inspector.check_status(&url).await;
        let update = DomainRecordUpdate::status(status, datetime::now_millis());

        let persisted = self.repository.update(id, &update).await;
        self.merge(id, &update).await;

        if let Err(e) = persisted {
            self.audit.error("Domain Refresh Persist Failed", &e);
            return Err(e);
        }
        Ok(status)
    }

    /// Re-run network analysis (DNS, geolocation, RDAP) for one record.
    ///
    /// Fields the lookup could not fill keep their previous values.
    pub async fn analyze(&self, id: &str) -> CoreResult<DomainRecord> {
        let url = self
            .get(id)
            .await
            .ok_or_else(|| CoreError::DomainNotFound(id.to_string()))?
            .url;

        let update = DomainRecordUpdate::network(self.inspector.network_details(&url).await);
        if update.is_empty() {
            log::info!("Network analysis of {url} returned nothing");
        }

        let persisted = self.repository.update(id, &update).await;
        let record = self
            .merge(id, &update)
            .await
            .ok_or_else(|| CoreError::DomainNotFound(id.to_string()))?;

        if let Err(e) = persisted {
            self.audit.error("Domain Analysis Persist Failed", &e);
            return Err(e);
        }
        self.audit.info(
            "Domain Analyzed",
            Some(json!({ "id": id, "ip": record.ip_address, "registrar": record.registrar })),
        );
        Ok(record)
    }

    /// Merge a user edit into memory and persist it.
    pub async fn edit(&self, id: &str, update: &DomainRecordUpdate) -> CoreResult<DomainRecord> {
        if update.is_empty() {
            return Err(CoreError::ValidationError("Nothing to update".to_string()));
        }
        let record = self
            .merge(id, update)
            .await
            .ok_or_else(|| CoreError::DomainNotFound(id.to_string()))?;

        self.repository.update(id, update).await?;
        self.audit.info("Domain Updated", Some(json!({ "id": id })));
        Ok(record)
    }

    // ===== 删除 =====

    /// Delete after confirmation. Returns `Ok(false)` when declined.
    ///
    /// The record is removed optimistically and restored if the store
    /// rejects the delete.
    pub async fn delete(&self, id: &str, prompt: &dyn ConfirmPrompt) -> CoreResult<bool> {
        let record = self
            .get(id)
            .await
            .ok_or_else(|| CoreError::DomainNotFound(id.to_string()))?;

        if !prompt.confirm(&format!("Delete {} ({})?", record.name, record.url)) {
            log::debug!("Delete of {id} declined");
            return Ok(false);
        }

        let position = {
            let mut records = self.records.write().await;
            let position = records.iter().position(|r| r.id == id);
            if let Some(index) = position {
                records.remove(index);
            }
            position
        };
        {
            let mut selected = self.selected.write().await;
            if selected.as_deref() == Some(id) {
                *selected = None;
            }
        }

        if let Err(e) = self.repository.delete(id).await {
            if let Some(index) = position {
                let mut records = self.records.write().await;
                let index = index.min(records.len());
                records.insert(index, record);
            }
            self.audit.error("Delete Domain Failed", &e);
            return Err(e);
        }

        self.audit.info(
            "Domain Deleted",
            Some(json!({ "id": id, "url": record.url })),
        );
        Ok(true)
    }

    // ===== 巡检 =====

    /// Probe every record concurrently and persist the results in one batch.
    pub async fn sweep(&self) -> CoreResult<SweepReport> {
        let targets: Vec<(String, String)> = {
            let mut records = self.records.write().await;
            if records.is_empty() {
                return Ok(SweepReport::default());
            }
            records
                .iter_mut()
                .map(|r| {
                    r.status = DomainStatus::Checking;
                    (r.id.clone(), r.url.clone())
                })
                .collect()
        };

        let inspector = &self.inspector;
        let statuses = join_all(
            targets
                .iter()
                .map(|(_, url)| async move { inspector.check_status(url).await }),
        )
        .await;

        let checked_at = datetime::now_millis();
        let items: Vec<BatchUpdateItem> = targets
            .into_iter()
            .zip(statuses)
            .map(|((id, _), status)| BatchUpdateItem {
                id,
                update: DomainRecordUpdate::status(status, checked_at),
            })
            .collect();

        let persisted = self.repository.batch_update(&items).await;

        let mut report = SweepReport {
            checked: items.len(),
            ..SweepReport::default()
        };
        {
            let mut records = self.records.write().await;
            for item in &items {
                if let Some(record) = records.iter_mut().find(|r| r.id == item.id) {
                    item.update.apply_to(record);
                }
                match item.update.status {
                    Some(DomainStatus::Online) => report.online += 1,
                    Some(DomainStatus::Offline) => report.offline += 1,
                    _ => {}
                }
            }
        }

        if let Err(e) = persisted {
            self.audit.error("Status Sweep Persist Failed", &e);
            return Err(e);
        }
        log::info!(
            "Sweep checked {} records: {} online, {} offline",
            report.checked,
            report.online,
            report.offline
        );
        Ok(report)
    }

    // ===== 导入 / 导出 =====

    /// Upsert records into the store and memory.
    pub async fn import(&self, records: Vec<DomainRecord>) -> CoreResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        self.repository.import(&records).await?;

        let count = records.len();
        {
            let mut current = self.records.write().await;
            for record in records {
                match current.iter_mut().find(|r| r.id == record.id) {
                    Some(existing) => *existing = record,
                    None => current.push(record),
                }
            }
        }
        self.audit
            .info("Domains Imported", Some(json!({ "count": count })));
        Ok(count)
    }

    pub async fn export(&self) -> Vec<DomainRecord> {
        self.records().await
    }

    async fn merge(&self, id: &str, update: &DomainRecordUpdate) -> Option<DomainRecord> {
        let mut records = self.records.write().await;
        let record = records.iter_mut().find(|r| r.id == id)?;
        update.apply_to(record);
        Some(record.clone())
    }
}

/// Prefix `https://` when no scheme is given; require a host.
pub fn normalize_url(input: &str) -> CoreResult<(String, String)> {
    let trimmed = input.trim();
    let lower = trimmed.to_ascii_lowercase();
    let url = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let hostname = hostname_of(&url).map_err(|e| CoreError::ValidationError(e.to_string()))?;
    Ok((url, hostname))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::{test_record, MockAuditStore, MockDomainRepository, MockInspector};
    use crate::traits::FixedAnswer;
    use crate::types::{ANALYZING_PLACEHOLDER, FETCHING_PLACEHOLDER};

    struct Fixture {
        controller: DomainController,
        repository: Arc<MockDomainRepository>,
        inspector: Arc<MockInspector>,
        audit_log: Arc<MockAuditStore>,
    }

    fn fixture() -> Fixture {
        fixture_with(MockInspector::new())
    }

    fn fixture_with(inspector: MockInspector) -> Fixture {
        let repository = Arc::new(MockDomainRepository::new());
        let inspector = Arc::new(inspector);
        let audit_log = Arc::new(MockAuditStore::new());
        let audit = AuditService::new(audit_log.clone(), Arc::new(MockAuditStore::new()));
        Fixture {
            controller: DomainController::new(repository.clone(), inspector.clone(), audit),
            repository,
            inspector,
            audit_log,
        }
    }

    async fn seeded(f: &Fixture, ids: &[&str]) {
        f.repository
            .seed(
                ids.iter()
                    .map(|id| test_record(id, &format!("https://{id}.example")))
                    .collect(),
            )
            .await;
        f.controller.load().await.unwrap();
    }

    async fn statuses(controller: &DomainController) -> Vec<DomainStatus> {
        controller.records().await.iter().map(|r| r.status).collect()
    }

    /// Snapshot the statuses once `probes` checks are blocked, then let them finish.
    async fn statuses_while_probing(f: &Fixture, probes: usize) -> Vec<DomainStatus> {
        while f.inspector.status_calls().await < probes {
            tokio::task::yield_now().await;
        }
        let during = statuses(&f.controller).await;
        f.inspector.release(probes);
        during
    }

    #[test]
    fn normalize_prefixes_scheme() {
        let (url, host) = normalize_url(" example.com/path ").unwrap();
        assert_eq!(url, "https://example.com/path");
        assert_eq!(host, "example.com");
        assert_eq!(normalize_url("HTTP://Example.com").unwrap().1, "example.com");
        assert!(matches!(normalize_url("   "), Err(CoreError::ValidationError(_))));
    }

    #[tokio::test]
    async fn add_inserts_provisional_record_first() {
        let f = fixture();
        f.repository.seed(vec![test_record("old", "https://old.example")]).await;
        f.controller.load().await.unwrap();

        let provisional = f.controller.begin_add("example.com").await.unwrap();

        let records = f.controller.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, provisional.id);
        assert_eq!(records[0].status, DomainStatus::Checking);
        assert_eq!(records[0].name, "example.com");
        assert_eq!(records[0].owner.as_deref(), Some(FETCHING_PLACEHOLDER));
        assert_eq!(records[0].description.as_deref(), Some(ANALYZING_PLACEHOLDER));
        assert!(records[0].favicon.as_deref().unwrap().contains("favicons"));
        assert_eq!(f.repository.records().await[0].id, provisional.id);
    }

    #[tokio::test]
    async fn add_completes_with_enrichment() {
        let f = fixture();
        f.inspector
            .set_status("https://example.com", DomainStatus::Offline)
            .await;

        let record = f.controller.add_domain("example.com").await.unwrap();

        assert_eq!(record.status, DomainStatus::Offline);
        assert_eq!(record.description.as_deref(), Some("No description available."));
        assert_eq!(record.registrar.as_deref(), Some("Mock Registrar"));
        assert_eq!(record.ip_address.as_deref(), Some("192.0.2.1"));

        let stored = f.repository.records().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0], record);
        assert_eq!(f.controller.get(&record.id).await.unwrap(), record);

        f.controller.audit.flush().await;
        assert!(f
            .audit_log
            .entries()
            .await
            .iter()
            .any(|e| e.action == "Domain Added"));
    }

    #[tokio::test]
    async fn add_rolls_back_when_persist_fails() {
        let f = fixture();
        f.repository
            .fail_next_add(CoreError::UniqueViolation("id".to_string()))
            .await;

        let err = f.controller.add_domain("example.com").await.unwrap_err();
        assert!(matches!(err, CoreError::UniqueViolation(_)));
        assert!(f.controller.is_empty().await);
        assert_eq!(f.inspector.status_calls().await, 0);

        f.controller.audit.flush().await;
        let entries = f.audit_log.entries().await;
        assert_eq!(entries[0].action, "Add Domain Failed");
    }

    #[tokio::test]
    async fn add_rejects_invalid_url() {
        let f = fixture();
        assert!(matches!(
            f.controller.add_domain("https://").await,
            Err(CoreError::ValidationError(_))
        ));
        assert!(f.controller.is_empty().await);
    }

    #[tokio::test]
    async fn refresh_unknown_id_is_not_found() {
        let f = fixture();
        assert_eq!(
            f.controller.refresh("missing").await,
            Err(CoreError::DomainNotFound("missing".to_string()))
        );
    }

    #[tokio::test]
    async fn refresh_persists_status() {
        let f = fixture();
        f.repository.seed(vec![test_record("a", "https://a.example")]).await;
        f.controller.load().await.unwrap();
        f.inspector
            .set_status("https://a.example", DomainStatus::Offline)
            .await;

        let status = f.controller.refresh("a").await.unwrap();

        assert_eq!(status, DomainStatus::Offline);
        assert_eq!(f.controller.get("a").await.unwrap().status, DomainStatus::Offline);
        assert_eq!(f.repository.records().await[0].status, DomainStatus::Offline);
    }

    #[tokio::test]
    async fn refresh_marks_only_target_checking_while_probing() {
        let f = fixture_with(MockInspector::gated());
        seeded(&f, &["a", "b"]).await;

        let (status, during) =
            tokio::join!(f.controller.refresh("a"), statuses_while_probing(&f, 1));

        assert_eq!(during, vec![DomainStatus::Checking, DomainStatus::Unknown]);
        assert_eq!(status.unwrap(), DomainStatus::Online);
        assert_eq!(
            statuses(&f.controller).await,
            vec![DomainStatus::Online, DomainStatus::Unknown]
        );
    }

    #[tokio::test]
    async fn analyze_refreshes_network_fields() {
        let f = fixture();
        let mut record = test_record("a", "https://a.example");
        record.owner = Some("Ops".to_string());
        record.location = Some("Paris, France".to_string());
        f.repository.seed(vec![record]).await;
        f.controller.load().await.unwrap();

        let analyzed = f.controller.analyze("a").await.unwrap();

        assert_eq!(analyzed.ip_address.as_deref(), Some("192.0.2.1"));
        assert_eq!(analyzed.registrar.as_deref(), Some("Mock Registrar"));
        assert_eq!(analyzed.owner.as_deref(), Some("Ops"));
        assert_eq!(analyzed.location.as_deref(), Some("Paris, France"));
        assert_eq!(analyzed.status, DomainStatus::Unknown);
        assert_eq!(f.repository.records().await[0], analyzed);
        assert_eq!(f.inspector.status_calls().await, 0);

        f.controller.audit.flush().await;
        assert_eq!(f.audit_log.entries().await[0].action, "Domain Analyzed");
    }

    #[tokio::test]
    async fn analyze_unknown_id_is_not_found() {
        let f = fixture();
        assert_eq!(
            f.controller.analyze("missing").await,
            Err(CoreError::DomainNotFound("missing".to_string()))
        );
    }

    #[tokio::test]
    async fn delete_declined_changes_nothing() {
        let f = fixture();
        f.repository.seed(vec![test_record("a", "https://a.example")]).await;
        f.controller.load().await.unwrap();
        f.controller.select(Some("a")).await.unwrap();

        let deleted = f.controller.delete("a", &FixedAnswer(false)).await.unwrap();

        assert!(!deleted);
        assert_eq!(f.controller.records().await.len(), 1);
        assert_eq!(f.repository.records().await.len(), 1);
        assert_eq!(f.controller.selected().await.unwrap().id, "a");
    }

    #[tokio::test]
    async fn delete_confirmed_removes_one_and_clears_selection() {
        let f = fixture();
        f.repository
            .seed(vec![
                test_record("a", "https://a.example"),
                test_record("b", "https://b.example"),
            ])
            .await;
        f.controller.load().await.unwrap();
        f.controller.select(Some("a")).await.unwrap();

        let deleted = f.controller.delete("a", &FixedAnswer(true)).await.unwrap();

        assert!(deleted);
        let remaining = f.controller.records().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "b");
        assert_eq!(f.repository.records().await.len(), 1);
        assert!(f.controller.selected().await.is_none());
    }

    #[tokio::test]
    async fn sweep_marks_all_and_batches_once() {
        let f = fixture();
        f.repository
            .seed(vec![
                test_record("a", "https://a.example"),
                test_record("b", "https://b.example"),
            ])
            .await;
        f.controller.load().await.unwrap();
        f.inspector
            .set_status("https://b.example", DomainStatus::Offline)
            .await;

        let report = f.controller.sweep().await.unwrap();

        assert_eq!(
            report,
            SweepReport {
                checked: 2,
                online: 1,
                offline: 1
            }
        );
        let batches = f.repository.batch_calls().await;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], vec!["a".to_string(), "b".to_string()]);
        assert_eq!(f.controller.get("b").await.unwrap().status, DomainStatus::Offline);
    }

    #[tokio::test]
    async fn sweep_marks_every_record_checking_while_probing() {
        let f = fixture_with(MockInspector::gated());
        seeded(&f, &["a", "b", "c"]).await;

        let (report, during) =
            tokio::join!(f.controller.sweep(), statuses_while_probing(&f, 3));

        assert_eq!(during, vec![DomainStatus::Checking; 3]);
        assert_eq!(report.unwrap().online, 3);
        assert_eq!(statuses(&f.controller).await, vec![DomainStatus::Online; 3]);
        assert_eq!(f.repository.batch_calls().await.len(), 1);
    }

    #[tokio::test]
    async fn sweep_on_empty_list_is_noop() {
        let f = fixture();
        let report = f.controller.sweep().await.unwrap();
        assert_eq!(report, SweepReport::default());
        assert!(f.repository.batch_calls().await.is_empty());
    }

    #[tokio::test]
    async fn import_upserts_and_filter_matches() {
        let f = fixture();
        f.repository.seed(vec![test_record("a", "https://a.example")]).await;
        f.controller.load().await.unwrap();

        let mut renamed = test_record("a", "https://a.example");
        renamed.name = "Alpha".to_string();
        let count = f
            .controller
            .import(vec![renamed, test_record("b", "https://b.example")])
            .await
            .unwrap();

        assert_eq!(count, 2);
        let records = f.controller.export().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Alpha");
        assert_eq!(f.controller.filter("alpha").await.len(), 1);
        assert_eq!(f.controller.filter("B.EXAMPLE").await[0].id, "b");
        assert_eq!(f.controller.import(Vec::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn edit_merges_and_persists() {
        let f = fixture();
        f.repository.seed(vec![test_record("a", "https://a.example")]).await;
        f.controller.load().await.unwrap();

        let update = DomainRecordUpdate {
            owner: Some("Ops".to_string()),
            ..DomainRecordUpdate::default()
        };
        let record = f.controller.edit("a", &update).await.unwrap();

        assert_eq!(record.owner.as_deref(), Some("Ops"));
        assert_eq!(f.repository.records().await[0].owner.as_deref(), Some("Ops"));
        assert!(matches!(
            f.controller.edit("zzz", &update).await,
            Err(CoreError::DomainNotFound(_))
        ));
    }
}
