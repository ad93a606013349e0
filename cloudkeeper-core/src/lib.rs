//! CloudKeeper Core Library
//!
//! Provides the business logic of the domain dashboard:
//! - Domain state controller (optimistic add/refresh/delete, enrichment merge)
//! - Periodic status sweep scheduler
//! - Audit logging with remote-first, local-fallback persistence
//! - Login gate
//!
//! Storage and network access are abstracted through traits so that the
//! platform layer can inject local or remote backends.

pub mod error;
pub mod services;
pub mod traits;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use services::ServiceContext;
pub use traits::{
    AuditLogStore, ConfirmPrompt, DomainInspector, DomainRepository, LoginDirectory, SessionStore,
};
