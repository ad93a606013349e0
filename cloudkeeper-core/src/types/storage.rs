//! Storage backend configuration

use serde::{Deserialize, Serialize};

/// Which backend holds the records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// File-backed key-value store in the data directory
    #[default]
    Local,
    /// PostgREST-style remote table
    #[serde(alias = "supabase")]
    Remote,
}

/// Persisted under `cloudkeeper_config_v2`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    #[serde(rename = "type")]
    pub kind: StorageKind,
    #[serde(default, alias = "supabaseUrl", skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(default, alias = "supabaseKey", skip_serializing_if = "Option::is_none")]
    pub remote_key: Option<String>,
}

impl StorageConfig {
    #[must_use]
    pub fn local() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn remote(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            kind: StorageKind::Remote,
            remote_url: Some(url.into()),
            remote_key: Some(key.into()),
        }
    }

    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.kind == StorageKind::Remote
    }

    /// URL and key, when remote mode is selected and both are non-empty.
    #[must_use]
    pub fn remote_credentials(&self) -> Option<(&str, &str)> {
        if !self.is_remote() {
            return None;
        }
        let url = self.remote_url.as_deref().filter(|s| !s.trim().is_empty())?;
        let key = self.remote_key.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((url, key))
    }
}
