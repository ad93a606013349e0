//! Storage layer abstraction trait definition

mod audit_log_store;
mod confirm_prompt;
mod domain_inspector;
mod domain_repository;
mod login_directory;
mod session_store;

pub use audit_log_store::AuditLogStore;
pub use confirm_prompt::{ConfirmPrompt, FixedAnswer};
pub use domain_inspector::DomainInspector;
pub use domain_repository::DomainRepository;
pub use login_directory::LoginDirectory;
pub use session_store::SessionStore;
