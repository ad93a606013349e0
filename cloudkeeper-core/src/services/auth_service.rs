//! 登录校验服务

use std::sync::Arc;

use serde_json::json;

use crate::error::{CoreError, CoreResult};
use crate::services::AuditService;
use crate::traits::{LoginDirectory, SessionStore};

const FALLBACK_USERNAME: &str = "admin";
const FALLBACK_PASSWORD: &str = "admin";

/// Login gate in front of the dashboard.
pub struct AuthService {
    directory: Arc<dyn LoginDirectory>,
    session: Arc<dyn SessionStore>,
    audit: AuditService,
}

impl AuthService {
    #[must_use]
    pub fn new(
        directory: Arc<dyn LoginDirectory>,
        session: Arc<dyn SessionStore>,
        audit: AuditService,
    ) -> Self {
        Self {
            directory,
            session,
            audit,
        }
    }

    /// Check credentials and set the session flag.
    ///
    /// With a remote store the `logins` table decides; without one the
    /// built-in `admin`/`admin` pair is accepted.
    pub async fn login(&self, username: &str, password: &str) -> CoreResult<()> {
        let outcome = match self.directory.verify(username, password).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(CoreError::InvalidCredentials(
                "Invalid username or password.".to_string(),
            )),
            Err(CoreError::RemoteNotConfigured) => {
                if username == FALLBACK_USERNAME && password == FALLBACK_PASSWORD {
                    Ok(())
                } else {
                    Err(CoreError::InvalidCredentials(
                        "Invalid credentials.".to_string(),
                    ))
                }
            }
            Err(CoreError::TableMissing { .. }) => Err(CoreError::TableMissing {
                table: "logins".to_string(),
            }),
            Err(e) => {
                log::warn!("Login lookup failed: {e}");
                Err(CoreError::NetworkError(
                    "Connection error. Please try again.".to_string(),
                ))
            }
        };

        match outcome {
            Ok(()) => {
                self.session.set_authenticated(true).await?;
                self.audit
                    .info("Login Succeeded", Some(json!({ "username": username })));
                Ok(())
            }
            Err(e) => {
                self.audit.warn(
                    "Login Failed",
                    Some(json!({ "username": username, "error": e.to_string() })),
                );
                Err(e)
            }
        }
    }

    pub async fn logout(&self) -> CoreResult<()> {
        self.session.set_authenticated(false).await?;
        self.audit.info("Logout", None);
        Ok(())
    }

    pub async fn is_authenticated(&self) -> CoreResult<bool> {
        self.session.is_authenticated().await
    }
}
