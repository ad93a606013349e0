//! Storage adapters: local JSON files, remote PostgREST table, and the
//! router that switches between them.

mod local_store;
mod remote_table;
mod storage_router;

pub use local_store::{LocalStore, APPS_KEY, AUDIT_LOGS_KEY, CONFIG_KEY, SESSION_KEY};
pub use remote_table::{classify_error, RemoteTable, AUDIT_LOGS_TABLE, DOMAINS_TABLE, LOGINS_TABLE};
pub use storage_router::{
    default_storage_config, RemoteAuditLog, StorageRouter, REMOTE_KEY_ENV, REMOTE_URL_ENV,
};
