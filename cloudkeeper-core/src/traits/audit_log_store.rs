//! Audit log persistence trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::AuditLogEntry;

/// Append-only audit log sink.
///
/// The local implementation is a bounded buffer (newest first); the remote
/// one writes to the `audit_logs` table.
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn append(&self, entry: &AuditLogEntry) -> CoreResult<()>;

    /// Newest first, at most `limit` entries.
    async fn recent(&self, limit: usize) -> CoreResult<Vec<AuditLogEntry>>;

    async fn clear(&self) -> CoreResult<()>;
}
