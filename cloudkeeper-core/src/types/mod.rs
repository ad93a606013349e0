//! 类型定义模块

mod audit;
mod domain;
mod storage;

pub use audit::{prepend_bounded, AuditLevel, AuditLogEntry, AUDIT_LOG_CAPACITY};
pub use domain::{
    BatchUpdateItem, DomainRecord, DomainRecordUpdate, DomainStatus, SweepReport,
    ANALYZING_PLACEHOLDER, FETCHING_PLACEHOLDER,
};
pub use storage::{StorageConfig, StorageKind};

// Re-export toolbox 库的公共类型
pub use cloudkeeper_toolbox::{AiMetadata, DnsRecordMap, NetworkInfo, Reachability};
