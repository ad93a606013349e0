//! Platform-agnostic application bootstrap for CloudKeeper.
//!
//! Provides `AppState` (service container) and `AppStateBuilder` (adapter
//! injection). Frontends build the state once at startup.

pub mod adapters;
mod setup_sql;

pub use setup_sql::setup_sql;

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;

use cloudkeeper_core::error::{CoreError, CoreResult};
use cloudkeeper_core::services::{AuditService, AuthService, DomainController, ServiceContext};
use cloudkeeper_core::traits::{DomainInspector, DomainRepository};
use cloudkeeper_core::types::StorageConfig;
use cloudkeeper_core::utils::RetryPolicy;
use cloudkeeper_toolbox::{ToolboxConfig, ToolboxService};

use adapters::{LocalStore, RemoteAuditLog, StorageRouter};

/// Platform-agnostic application state.
///
/// Holds all services and the `ServiceContext`.
pub struct AppState {
    /// Service context (holds all storage adapters)
    pub ctx: Arc<ServiceContext>,
    /// Local key-value store in the data directory
    pub local_store: Arc<LocalStore>,
    /// Backend router (local / remote)
    pub storage: Arc<StorageRouter>,
    /// Domain state controller
    pub controller: Arc<DomainController>,
    /// Audit logger
    pub audit: AuditService,
    /// Login gate
    pub auth: AuthService,
}

impl AppState {
    /// Load the record list from the current backend.
    pub async fn run_startup(&self) -> CoreResult<usize> {
        let config = self.storage.config().await?;
        log::info!("Using {:?} storage", config.kind);
        self.controller.load().await
    }

    /// Switch storage backends.
    ///
    /// Remote configs are verified by listing records; on success the
    /// in-memory list is reloaded from the new backend.
    pub async fn configure_storage(&self, config: StorageConfig) -> CoreResult<usize> {
        if config.is_remote() && config.remote_credentials().is_none() {
            return Err(CoreError::ValidationError(
                "Remote URL and key are required".to_string(),
            ));
        }

        self.storage.save_config(&config).await?;

        if config.is_remote() {
            if let Err(e) = self.storage.list().await {
                if e.is_setup_error() {
                    log::warn!("Remote schema missing: {e}");
                } else {
                    log::error!("Remote connection failed: {e}");
                }
                self.audit.error("Storage Configuration Failed", &e);
                return Err(e);
            }
        }

        let count = self.controller.load().await?;
        self.audit.info(
            "Storage Configuration Updated",
            Some(json!({ "type": config.kind, "records": count })),
        );
        Ok(count)
    }
}

/// Builder for constructing `AppState`.
///
/// # Required
/// - `data_dir` — where the local store lives
///
/// # Optional
/// - `inspector` — defaults to a `ToolboxService` built from `toolbox_config`
/// - `retry_policy` — remote store retry policy
pub struct AppStateBuilder {
    data_dir: Option<PathBuf>,
    toolbox_config: ToolboxConfig,
    inspector: Option<Arc<dyn DomainInspector>>,
    retry_policy: RetryPolicy,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data_dir: None,
            toolbox_config: ToolboxConfig::default(),
            inspector: None,
            retry_policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn toolbox_config(mut self, config: ToolboxConfig) -> Self {
        self.toolbox_config = config;
        self
    }

    #[must_use]
    pub fn inspector(mut self, inspector: Arc<dyn DomainInspector>) -> Self {
        self.inspector = Some(inspector);
        self
    }

    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Build the `AppState`.
    ///
    /// # Errors
    /// Returns `CoreError::ValidationError` if `data_dir` is missing.
    pub fn build(self) -> CoreResult<AppState> {
        let data_dir = self
            .data_dir
            .ok_or_else(|| CoreError::ValidationError("data_dir is required".to_string()))?;

        let inspector: Arc<dyn DomainInspector> = match self.inspector {
            Some(inspector) => inspector,
            None => Arc::new(
                ToolboxService::new(self.toolbox_config)
                    .map_err(|e| CoreError::NetworkError(e.to_string()))?,
            ),
        };

        let local_store = Arc::new(LocalStore::new(data_dir));
        let storage = Arc::new(
            StorageRouter::new(Arc::clone(&local_store)).with_retry_policy(self.retry_policy),
        );

        let ctx = Arc::new(ServiceContext::new(
            storage.clone(),
            inspector,
            Arc::new(RemoteAuditLog::new(Arc::clone(&storage))),
            local_store.clone(),
            storage.clone(),
            local_store.clone(),
        ));

        let audit = ctx.audit_service();
        let auth = ctx.auth_service();
        let controller = Arc::new(ctx.domain_controller());

        Ok(AppState {
            ctx,
            local_store,
            storage,
            controller,
            audit,
            auth,
        })
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
