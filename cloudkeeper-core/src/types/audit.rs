//! Audit log types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::datetime;

/// Maximum number of entries kept in the local fallback buffer.
pub const AUDIT_LOG_CAPACITY: usize = 1000;

/// 审计日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// 审计日志条目（写入后不可变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    /// RFC 3339
    pub timestamp: String,
    pub level: AuditLevel,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AuditLogEntry {
    #[must_use]
    pub fn new(
        level: AuditLevel,
        action: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: datetime::now_rfc3339(),
            level,
            action: action.into(),
            details,
        }
    }
}

/// Prepend `entry`, evicting the oldest entries beyond [`AUDIT_LOG_CAPACITY`].
pub fn prepend_bounded(buffer: &mut Vec<AuditLogEntry>, entry: AuditLogEntry) {
    buffer.insert(0, entry);
    buffer.truncate(AUDIT_LOG_CAPACITY);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn buffer_keeps_newest_thousand() {
        let mut buffer = Vec::new();
        for i in 0..=AUDIT_LOG_CAPACITY {
            prepend_bounded(
                &mut buffer,
                AuditLogEntry::new(AuditLevel::Info, format!("action-{i}"), None),
            );
        }
        assert_eq!(buffer.len(), AUDIT_LOG_CAPACITY);
        assert_eq!(buffer[0].action, format!("action-{AUDIT_LOG_CAPACITY}"));
        assert_eq!(buffer[AUDIT_LOG_CAPACITY - 1].action, "action-1");
    }

    #[test]
    fn level_serializes_uppercase() {
        let entry = AuditLogEntry::new(AuditLevel::Warn, "Login Failed", None);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["level"], "WARN");
        assert!(json.get("details").is_none());
    }
}
