//! Session flag persistence

use async_trait::async_trait;

use crate::error::CoreResult;

/// 登录状态存储 (`cloudkeeper_auth_session`)
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn is_authenticated(&self) -> CoreResult<bool>;

    async fn set_authenticated(&self, authenticated: bool) -> CoreResult<()>;
}
