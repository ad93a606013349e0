//! 业务逻辑服务层

mod audit_service;
mod auth_service;
mod domain_controller;
mod sweep_scheduler;

pub use audit_service::AuditService;
pub use auth_service::AuthService;
pub use domain_controller::{normalize_url, DomainController};
pub use sweep_scheduler::{SweepHandle, SweepScheduler, DEFAULT_SWEEP_INTERVAL};

use std::sync::Arc;

use crate::traits::{
    AuditLogStore, DomainInspector, DomainRepository, LoginDirectory, SessionStore,
};

/// 服务上下文 - 持有所有依赖
///
/// 平台层需要创建此上下文，并注入平台特定的存储实现。
pub struct ServiceContext {
    /// 域名记录仓库
    pub domain_repository: Arc<dyn DomainRepository>,
    /// 外部数据获取（状态探测 / 网络信息 / AI）
    pub inspector: Arc<dyn DomainInspector>,
    /// 远程审计日志表
    pub remote_audit_store: Arc<dyn AuditLogStore>,
    /// 本地审计日志缓冲
    pub local_audit_store: Arc<dyn AuditLogStore>,
    /// 登录表
    pub login_directory: Arc<dyn LoginDirectory>,
    /// 登录状态
    pub session_store: Arc<dyn SessionStore>,
    /// Every service logs through a clone of this one
    audit: AuditService,
}

impl ServiceContext {
    /// 创建服务上下文
    #[must_use]
    pub fn new(
        domain_repository: Arc<dyn DomainRepository>,
        inspector: Arc<dyn DomainInspector>,
        remote_audit_store: Arc<dyn AuditLogStore>,
        local_audit_store: Arc<dyn AuditLogStore>,
        login_directory: Arc<dyn LoginDirectory>,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        let audit = AuditService::new(remote_audit_store.clone(), local_audit_store.clone());
        Self {
            domain_repository,
            inspector,
            remote_audit_store,
            local_audit_store,
            login_directory,
            session_store,
            audit,
        }
    }

    /// Handle to the context's audit logger.
    #[must_use]
    pub fn audit_service(&self) -> AuditService {
        self.audit.clone()
    }

    #[must_use]
    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            self.login_directory.clone(),
            self.session_store.clone(),
            self.audit_service(),
        )
    }

    #[must_use]
    pub fn domain_controller(&self) -> DomainController {
        DomainController::new(
            self.domain_repository.clone(),
            self.inspector.clone(),
            self.audit_service(),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::test_utils::{
        MockAuditStore, MockDomainRepository, MockInspector, MockLoginDirectory,
        MockSessionStore,
    };

    #[tokio::test]
    async fn one_flush_covers_every_service() {
        let local = Arc::new(MockAuditStore::new());
        let ctx = ServiceContext::new(
            Arc::new(MockDomainRepository::new()),
            Arc::new(MockInspector::new()),
            Arc::new(MockAuditStore::failing(CoreError::RemoteNotConfigured)),
            local.clone(),
            Arc::new(MockLoginDirectory::with_login("alice", "s3cret")),
            Arc::new(MockSessionStore::new()),
        );

        ctx.auth_service().logout().await.unwrap();
        ctx.domain_controller()
            .import(vec![crate::test_utils::test_record("a", "https://a.example")])
            .await
            .unwrap();
        ctx.audit_service().flush().await;

        let mut actions: Vec<String> =
            local.entries().await.into_iter().map(|e| e.action).collect();
        actions.sort();
        assert_eq!(actions, vec!["Domains Imported", "Logout"]);
    }
}
