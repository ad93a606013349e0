//! 远程表存储适配器 (PostgREST)
//!
//! Talks to `/rest/v1/<table>` with the `apikey` and bearer headers. Every
//! operation runs through [`with_retry`]; error bodies are classified so
//! missing tables and unique violations fail fast.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use cloudkeeper_core::error::{CoreError, CoreResult};
use cloudkeeper_core::traits::{AuditLogStore, DomainRepository, LoginDirectory};
use cloudkeeper_core::types::{
    AuditLogEntry, BatchUpdateItem, DomainRecord, DomainRecordUpdate, AUDIT_LOG_CAPACITY,
};
use cloudkeeper_core::utils::{with_retry, RetryPolicy};

pub const DOMAINS_TABLE: &str = "domains";
pub const LOGINS_TABLE: &str = "logins";
pub const AUDIT_LOGS_TABLE: &str = "audit_logs";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// PostgREST error body.
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DataRow<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct DomainRow<'a> {
    id: &'a str,
    data: &'a DomainRecord,
}

/// 远程表客户端
pub struct RemoteTable {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl RemoteTable {
    pub fn new(base_url: &str, api_key: &str) -> CoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CoreError::NetworkError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            retry: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/rest/v1/{table}", self.base_url))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// 发送请求并将非 2xx 响应转换为 `CoreError`
    async fn send(&self, table: &str, request: RequestBuilder) -> CoreResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| CoreError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_error(table, status, &body))
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        request: RequestBuilder,
    ) -> CoreResult<T> {
        let response = self.send(table, request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| CoreError::SerializationError(format!("{table}: {e}")))
    }

    // ===== domains =====

    async fn fetch_row(&self, id: &str) -> CoreResult<Option<Value>> {
        let filter = format!("eq.{id}");
        let rows: Vec<DataRow<Value>> = self
            .fetch_json(
                DOMAINS_TABLE,
                self.request(Method::GET, DOMAINS_TABLE)
                    .query(&[("select", "data"), ("id", filter.as_str())]),
            )
            .await?;
        Ok(rows.into_iter().next().map(|row| row.data))
    }

    async fn update_once(&self, id: &str, update: &DomainRecordUpdate) -> CoreResult<()> {
        let Some(mut data) = self.fetch_row(id).await? else {
            log::debug!("Remote update of missing row {id} skipped");
            return Ok(());
        };
        merge_update(&mut data, update)?;

        self.send(
            DOMAINS_TABLE,
            self.request(Method::PATCH, DOMAINS_TABLE)
                .query(&[("id", format!("eq.{id}"))])
                .json(&json!({ "data": data })),
        )
        .await?;
        Ok(())
    }
}

/// Shallow merge of the present fields of `update` into a JSON object.
fn merge_update(data: &mut Value, update: &DomainRecordUpdate) -> CoreResult<()> {
    let patch =
        serde_json::to_value(update).map_err(|e| CoreError::SerializationError(e.to_string()))?;
    match (data.as_object_mut(), patch) {
        (Some(target), Value::Object(fields)) => {
            target.extend(fields);
            Ok(())
        }
        _ => Err(CoreError::SerializationError(
            "Stored row data is not an object".to_string(),
        )),
    }
}

/// Map a PostgREST error response onto `CoreError`.
pub fn classify_error(table: &str, status: StatusCode, body: &str) -> CoreError {
    let parsed: PostgrestError = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.code.unwrap_or_default();
    let message = parsed.message.unwrap_or_else(|| body.trim().to_string());

    let names_table = message.contains(table);
    if code == "42P01"
        || code == "PGRST205"
        || (status == StatusCode::NOT_FOUND && names_table)
    {
        return CoreError::TableMissing {
            table: table.to_string(),
        };
    }
    if code == "23505" || status == StatusCode::CONFLICT {
        return CoreError::UniqueViolation(message);
    }

    CoreError::RemoteError {
        code: if code.is_empty() {
            status.as_u16().to_string()
        } else {
            code
        },
        message,
    }
}

#[async_trait]
impl DomainRepository for RemoteTable {
    async fn list(&self) -> CoreResult<Vec<DomainRecord>> {
        with_retry(&self.retry, "remote list", move || async move {
            let rows: Vec<DataRow<DomainRecord>> = self
                .fetch_json(
                    DOMAINS_TABLE,
                    self.request(Method::GET, DOMAINS_TABLE)
                        .query(&[("select", "data")]),
                )
                .await?;
            Ok(rows.into_iter().map(|row| row.data).collect())
        })
        .await
    }

    async fn add(&self, record: &DomainRecord) -> CoreResult<()> {
        with_retry(&self.retry, "remote add", move || async move {
            self.send(
                DOMAINS_TABLE,
                self.request(Method::POST, DOMAINS_TABLE)
                    .header("Prefer", "return=minimal")
                    .json(&DomainRow {
                        id: &record.id,
                        data: record,
                    }),
            )
            .await
            .map(|_| ())
        })
        .await
    }

    async fn update(&self, id: &str, update: &DomainRecordUpdate) -> CoreResult<()> {
        with_retry(&self.retry, "remote update", move || self.update_once(id, update)).await
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        with_retry(&self.retry, "remote delete", move || async move {
            self.send(
                DOMAINS_TABLE,
                self.request(Method::DELETE, DOMAINS_TABLE)
                    .query(&[("id", format!("eq.{id}"))]),
            )
            .await
            .map(|_| ())
        })
        .await
    }

    async fn batch_update(&self, items: &[BatchUpdateItem]) -> CoreResult<()> {
        let results = join_all(
            items
                .iter()
                .map(|item| self.update(&item.id, &item.update)),
        )
        .await;
        results.into_iter().collect()
    }

    async fn import(&self, records: &[DomainRecord]) -> CoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let rows: Vec<DomainRow<'_>> = records
            .iter()
            .map(|r| DomainRow { id: &r.id, data: r })
            .collect();
        let rows = &rows;

        with_retry(&self.retry, "remote import", move || async move {
            self.send(
                DOMAINS_TABLE,
                self.request(Method::POST, DOMAINS_TABLE)
                    .query(&[("on_conflict", "id")])
                    .header("Prefer", "resolution=merge-duplicates,return=minimal")
                    .json(&rows),
            )
            .await
            .map(|_| ())
        })
        .await
    }
}

#[async_trait]
impl LoginDirectory for RemoteTable {
    async fn verify(&self, username: &str, password: &str) -> CoreResult<bool> {
        with_retry(&self.retry, "remote login", move || async move {
            let rows: Vec<Value> = self
                .fetch_json(
                    LOGINS_TABLE,
                    self.request(Method::GET, LOGINS_TABLE).query(&[
                        ("select", "username".to_string()),
                        ("username", format!("eq.{username}")),
                        ("password", format!("eq.{password}")),
                        ("limit", "1".to_string()),
                    ]),
                )
                .await?;
            Ok(!rows.is_empty())
        })
        .await
    }
}

#[async_trait]
impl AuditLogStore for RemoteTable {
    async fn append(&self, entry: &AuditLogEntry) -> CoreResult<()> {
        with_retry(&self.retry, "remote audit", move || async move {
            self.send(
                AUDIT_LOGS_TABLE,
                self.request(Method::POST, AUDIT_LOGS_TABLE)
                    .header("Prefer", "return=minimal")
                    .json(entry),
            )
            .await
            .map(|_| ())
        })
        .await
    }

    async fn recent(&self, limit: usize) -> CoreResult<Vec<AuditLogEntry>> {
        let limit = limit.min(AUDIT_LOG_CAPACITY).to_string();
        let limit = limit.as_str();
        with_retry(&self.retry, "remote audit read", move || async move {
            self.fetch_json(
                AUDIT_LOGS_TABLE,
                self.request(Method::GET, AUDIT_LOGS_TABLE).query(&[
                    ("select", "*"),
                    ("order", "timestamp.desc"),
                    ("limit", limit),
                ]),
            )
            .await
        })
        .await
    }

    async fn clear(&self) -> CoreResult<()> {
        Err(CoreError::ValidationError(
            "The remote audit log cannot be cleared from the client".to_string(),
        ))
    }
}
