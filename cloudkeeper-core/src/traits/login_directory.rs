//! Login lookup trait

use async_trait::async_trait;

use crate::error::CoreResult;

/// Credential table lookup.
#[async_trait]
pub trait LoginDirectory: Send + Sync {
    /// Whether a row with exactly this username and password exists.
    ///
    /// # Errors
    /// * `RemoteNotConfigured` - no remote table to look in
    /// * `TableMissing` - the `logins` table does not exist
    async fn verify(&self, username: &str, password: &str) -> CoreResult<bool>;
}
