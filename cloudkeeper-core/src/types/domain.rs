//! Tracked domain record types

use std::fmt;

use cloudkeeper_toolbox::{AiMetadata, DnsRecordMap, NetworkInfo, Reachability};
use serde::{Deserialize, Serialize};

/// Placeholder shown while enrichment is running.
pub const FETCHING_PLACEHOLDER: &str = "Fetching...";
/// Placeholder description shown while AI metadata is pending.
pub const ANALYZING_PLACEHOLDER: &str = "Analyzing...";

/// Reachability state of a record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainStatus {
    /// Last probe completed
    Online,
    /// Last probe failed
    Offline,
    /// A probe is in flight
    Checking,
    /// Never probed
    #[default]
    Unknown,
}

impl DomainStatus {
    /// Whether a probe has resolved this status.
    #[must_use]
    pub fn is_resolved(self) -> bool {
        matches!(self, Self::Online | Self::Offline)
    }
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Checking => "checking",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

impl From<Reachability> for DomainStatus {
    fn from(value: Reachability) -> Self {
        match value {
            Reachability::Online => Self::Online,
            Reachability::Offline => Self::Offline,
        }
    }
}

/// One tracked domain.
///
/// Serialized with camelCase keys so stored data stays compatible across
/// backends (`lastChecked`, `registrationDate`, `ipAddress`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    pub id: String,
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub status: DomainStatus,
    /// Epoch milliseconds of the last probe
    #[serde(default)]
    pub last_checked: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registrar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registrar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nameservers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_records: Option<DnsRecordMap>,
}

impl DomainRecord {
    /// 创建添加流程第一阶段使用的占位记录
    #[must_use]
    pub fn provisional(
        id: String,
        url: String,
        hostname: String,
        favicon: String,
        now_ms: i64,
    ) -> Self {
        Self {
            id,
            url,
            name: hostname,
            status: DomainStatus::Checking,
            last_checked: now_ms,
            favicon: Some(favicon),
            owner: Some(FETCHING_PLACEHOLDER.to_string()),
            description: Some(ANALYZING_PLACEHOLDER.to_string()),
            registrar: None,
            registrar_url: None,
            registration_date: Some(FETCHING_PLACEHOLDER.to_string()),
            expires_at: None,
            ip_address: None,
            location: None,
            isp: None,
            nameservers: None,
            dns_records: None,
        }
    }

    /// Case-insensitive match on name or URL.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query) || self.url.to_lowercase().contains(&query)
    }
}

/// Partial update of a [`DomainRecord`].
///
/// Only `Some` fields are applied or serialized, so the JSON form is directly
/// usable as a shallow merge patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecordUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DomainStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registrar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registrar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nameservers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_records: Option<DnsRecordMap>,
}

impl DomainRecordUpdate {
    /// Update produced by a single probe.
    #[must_use]
    pub fn status(status: DomainStatus, checked_at_ms: i64) -> Self {
        Self {
            status: Some(status),
            last_checked: Some(checked_at_ms),
            ..Self::default()
        }
    }

    /// Authoritative update at the end of the add flow.
    ///
    /// AI metadata fills the descriptive fields; RDAP-derived registrar and
    /// dates from `network` override the AI guesses when present.
    #[must_use]
    pub fn enrichment(
        metadata: AiMetadata,
        network: NetworkInfo,
        status: DomainStatus,
        checked_at_ms: i64,
    ) -> Self {
        let dns_records = (!network.dns_records.is_empty()).then_some(network.dns_records);
        let nameservers = (!network.nameservers.is_empty()).then_some(network.nameservers);

        Self {
            url: None,
            name: Some(metadata.name),
            status: Some(status),
            last_checked: Some(checked_at_ms),
            favicon: None,
            owner: Some(metadata.owner),
            description: Some(metadata.description),
            registrar: Some(network.registrar.unwrap_or(metadata.registrar)),
            registrar_url: network.registrar_url,
            registration_date: Some(
                network
                    .registration_date
                    .unwrap_or(metadata.registration_date),
            ),
            expires_at: Some(network.expires_at.unwrap_or(metadata.expires_at)),
            ip_address: network.ip_address,
            location: network.location,
            isp: network.isp,
            nameservers,
            dns_records,
        }
    }

    /// Update from a fresh network analysis. Absent values keep what the
    /// record already has.
    #[must_use]
    pub fn network(network: NetworkInfo) -> Self {
        Self {
            registrar: network.registrar,
            registrar_url: network.registrar_url,
            registration_date: network.registration_date,
            expires_at: network.expires_at,
            ip_address: network.ip_address,
            location: network.location,
            isp: network.isp,
            nameservers: (!network.nameservers.is_empty()).then_some(network.nameservers),
            dns_records: (!network.dns_records.is_empty()).then_some(network.dns_records),
            ..Self::default()
        }
    }

    /// Whether the update carries no field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow merge of all `Some` fields into `record`.
    pub fn apply_to(&self, record: &mut DomainRecord) {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(value) = &self.$field {
                        record.$field = value.clone();
                    }
                )*
            };
        }
        macro_rules! merge_opt {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(value) = &self.$field {
                        record.$field = Some(value.clone());
                    }
                )*
            };
        }

        merge!(url, name, status, last_checked);
        merge_opt!(
            favicon,
            owner,
            description,
            registrar,
            registrar_url,
            registration_date,
            expires_at,
            ip_address,
            location,
            isp,
            nameservers,
            dns_records,
        );
    }
}

/// One element of a batch update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchUpdateItem {
    pub id: String,
    pub update: DomainRecordUpdate,
}

/// Result of one status sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub checked: usize,
    pub online: usize,
    pub offline: usize,
}
