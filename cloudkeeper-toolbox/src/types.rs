//! Public types returned by toolbox operations.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// DNS answers grouped by record type (`"A"`, `"MX"`, ...).
pub type DnsRecordMap = BTreeMap<String, Vec<String>>;

/// Record types dumped for every tracked domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsQueryType {
    /// IPv4 address record.
    A,
    /// IPv6 address record.
    Aaaa,
    /// Mail exchange record.
    Mx,
    /// Text record.
    Txt,
    /// Name server record.
    Ns,
    /// Canonical name (alias) record.
    Cname,
}

impl DnsQueryType {
    /// Every type included in a record dump, in query order.
    pub const DUMP: [Self; 6] = [Self::A, Self::Aaaa, Self::Mx, Self::Txt, Self::Ns, Self::Cname];
}

impl fmt::Display for DnsQueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::Aaaa => write!(f, "AAAA"),
            Self::Mx => write!(f, "MX"),
            Self::Txt => write!(f, "TXT"),
            Self::Ns => write!(f, "NS"),
            Self::Cname => write!(f, "CNAME"),
        }
    }
}

/// Outcome of a single reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reachability {
    /// The request completed (any HTTP status).
    Online,
    /// The request failed: timeout, DNS failure, refused connection, TLS error.
    Offline,
}

/// Geolocation of a resolved IP address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoInfo {
    /// `"City, Country"`.
    pub location: Option<String>,
    /// Internet service provider, `"Unknown"` when the service omits it.
    pub isp: Option<String>,
}

/// Registration data parsed from an RDAP domain response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdapInfo {
    pub registrar: Option<String>,
    pub registrar_url: Option<String>,
    /// `YYYY-MM-DD`
    pub registration_date: Option<String>,
    /// `YYYY-MM-DD`
    pub expires_at: Option<String>,
    /// Lowercased, without trailing dot.
    pub nameservers: Vec<String>,
}

/// Merged result of all network-derived sources for one hostname.
///
/// Any field may be missing: each source degrades independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub ip_address: Option<String>,
    pub location: Option<String>,
    pub isp: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dns_records: DnsRecordMap,
    pub registrar: Option<String>,
    pub registrar_url: Option<String>,
    pub registration_date: Option<String>,
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nameservers: Vec<String>,
}

impl NetworkInfo {
    /// Overlay RDAP data. Present RDAP fields win over what is already set.
    pub fn merge_rdap(&mut self, rdap: RdapInfo) {
        if rdap.registrar.is_some() {
            self.registrar = rdap.registrar;
        }
        if rdap.registrar_url.is_some() {
            self.registrar_url = rdap.registrar_url;
        }
        if rdap.registration_date.is_some() {
            self.registration_date = rdap.registration_date;
        }
        if rdap.expires_at.is_some() {
            self.expires_at = rdap.expires_at;
        }
        if !rdap.nameservers.is_empty() {
            self.nameservers = rdap.nameservers;
        }
    }

    /// Overlay geolocation data for the resolved IP.
    pub fn merge_geo(&mut self, geo: GeoInfo) {
        if geo.location.is_some() {
            self.location = geo.location;
        }
        if geo.isp.is_some() {
            self.isp = geo.isp;
        }
    }
}

/// AI-generated description of a domain.
///
/// Always fully populated: on any failure the toolbox substitutes
/// [`AiMetadata::fallback`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMetadata {
    pub name: String,
    pub description: String,
    pub owner: String,
    pub registration_date: String,
    #[serde(default = "unknown")]
    pub expires_at: String,
    #[serde(default = "unknown")]
    pub registrar: String,
}

fn unknown() -> String {
    "Unknown".to_string()
}

impl AiMetadata {
    /// Deterministic metadata derived only from the hostname.
    #[must_use]
    pub fn fallback(hostname: &str) -> Self {
        Self {
            name: hostname.to_string(),
            description: "No description available.".to_string(),
            owner: unknown(),
            registration_date: unknown(),
            expires_at: unknown(),
            registrar: unknown(),
        }
    }
}
