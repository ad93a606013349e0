//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

/// Core layer error type
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// A required remote table does not exist yet (setup error)
    #[error("Table '{table}' does not exist. Run the setup script first.")]
    TableMissing { table: String },

    /// Unique constraint violation on insert
    #[error("Duplicate entry: {0}")]
    UniqueViolation(String),

    /// Remote storage selected but URL or key missing
    #[error("Remote storage is not configured")]
    RemoteNotConfigured,

    /// Remote store answered with an error
    #[error("Remote error {code}: {message}")]
    RemoteError { code: String, message: String },

    /// network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Domain record not found
    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    /// Invalid login
    #[error("{0}")]
    InvalidCredentials(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl CoreError {
    /// Whether it is expected behavior (user input, resource does not exist, etc.) is used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added. **
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::DomainNotFound(_)
                | Self::ValidationError(_)
                | Self::InvalidCredentials(_)
                | Self::UniqueViolation(_)
                | Self::TableMissing { .. }
                | Self::RemoteNotConfigured
        )
    }

    /// Setup errors route the user to schema instructions instead of a retry.
    #[must_use]
    pub fn is_setup_error(&self) -> bool {
        matches!(self, Self::TableMissing { .. })
    }

    /// Whether the retry wrapper may attempt the operation again.
    ///
    /// Only transport failures and remote server errors are transient.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError(_) | Self::RemoteError { .. })
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
