//! Enrichment toolbox for CloudKeeper
//!
//! Network helpers used to fill in a tracked domain's details: a reachability
//! probe, DNS-over-HTTPS resolution, IP geolocation, RDAP registration data,
//! AI-generated descriptions and favicon URLs.
//!
//! The aggregate entry points ([`ToolboxService::network_details`],
//! [`ToolboxService::ai_metadata`], [`ToolboxService::check_status`]) never
//! fail: every upstream error degrades to an empty or default result.

mod error;
mod services;
mod types;

pub use error::{ToolboxError, ToolboxResult};
pub use services::{favicon_url, hostname_of, ToolboxConfig, ToolboxService};
pub use types::{AiMetadata, DnsRecordMap, GeoInfo, NetworkInfo, RdapInfo, Reachability};
