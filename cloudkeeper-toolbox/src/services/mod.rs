//! Service façade exposing all toolbox operations.
//!
//! [`ToolboxService`] owns one shared HTTP client and the upstream endpoints;
//! the individual fetchers live in the submodules and are plain functions.

mod ai;
mod dns;
mod favicon;
mod ip;
mod network;
mod rdap;
mod status;

use std::time::Duration;

pub use favicon::favicon_url;

use crate::error::{ToolboxError, ToolboxResult};
use crate::types::{AiMetadata, NetworkInfo, Reachability};

/// Upstream endpoints and timeouts used by the toolbox.
///
/// Base URLs carry no trailing path; tests point them at a local mock server.
#[derive(Debug, Clone)]
pub struct ToolboxConfig {
    /// DNS-over-HTTPS JSON API (`/resolve`).
    pub doh_endpoint: String,
    /// IP geolocation API (`/{ip}`).
    pub geo_endpoint: String,
    /// RDAP bootstrap service (`/domain/{name}`).
    pub rdap_endpoint: String,
    /// Generative language API root.
    pub ai_endpoint: String,
    /// Model used for metadata generation.
    pub ai_model: String,
    /// API key for the AI endpoint. `None` disables the call.
    pub ai_api_key: Option<String>,
    /// Bound on a single reachability probe.
    pub probe_timeout: Duration,
    /// Bound on every enrichment request.
    pub request_timeout: Duration,
}

impl Default for ToolboxConfig {
    fn default() -> Self {
        Self {
            doh_endpoint: "https://dns.google".to_string(),
            geo_endpoint: "https://ipwho.is".to_string(),
            rdap_endpoint: "https://rdap.org".to_string(),
            ai_endpoint: "https://generativelanguage.googleapis.com".to_string(),
            ai_model: "gemini-2.5-flash".to_string(),
            ai_api_key: None,
            probe_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Entry point for all enrichment operations.
///
/// ```rust,no_run
/// use cloudkeeper_toolbox::{ToolboxConfig, ToolboxService};
/// # async fn demo() -> cloudkeeper_toolbox::ToolboxResult<()> {
/// let toolbox = ToolboxService::new(ToolboxConfig::default())?;
/// let info = toolbox.network_details("https://example.com").await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolboxService {
    client: reqwest::Client,
    config: ToolboxConfig,
}

impl ToolboxService {
    /// Build the service and its shared HTTP client.
    pub fn new(config: ToolboxConfig) -> ToolboxResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("cloudkeeper/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ToolboxError::NetworkError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Active configuration.
    pub fn config(&self) -> &ToolboxConfig {
        &self.config
    }

    /// Probe a URL once. Never retries, never fails.
    pub async fn check_status(&self, url: &str) -> Reachability {
        status::check_status(&self.client, url, self.config.probe_timeout).await
    }

    /// Aggregate DNS, geolocation and RDAP data for the URL's hostname.
    ///
    /// Never fails; unreachable sources leave their fields empty.
    pub async fn network_details(&self, url: &str) -> NetworkInfo {
        network::network_details(&self.client, &self.config, url).await
    }

    /// Ask the AI endpoint to describe the domain.
    ///
    /// Falls back to [`AiMetadata::fallback`] on any failure.
    pub async fn ai_metadata(&self, url: &str) -> AiMetadata {
        ai::ai_metadata(&self.client, &self.config, url).await
    }
}

/// Extract the hostname of a URL, accepting bare hosts (`example.com`).
pub fn hostname_of(url: &str) -> ToolboxResult<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ToolboxError::ValidationError("URL is required".to_string()));
    }
    let candidate = if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{url}")
    };
    let parsed = url::Url::parse(&candidate)
        .map_err(|e| ToolboxError::ValidationError(format!("Invalid URL {url}: {e}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| ToolboxError::ValidationError(format!("URL has no host: {url}")))?;
    // IPv6 hosts come back bracketed.
    Ok(host.trim_start_matches('[').trim_end_matches(']').to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::hostname_of;
    use crate::error::ToolboxError;

    #[test]
    fn hostname_from_full_url() {
        assert_eq!(
            hostname_of("https://app.example.com:8443/path?q=1").unwrap(),
            "app.example.com"
        );
    }

    #[test]
    fn hostname_from_bare_host() {
        assert_eq!(hostname_of("  example.com  ").unwrap(), "example.com");
    }

    #[test]
    fn hostname_idn_is_punycoded() {
        assert_eq!(hostname_of("https://münchen.de").unwrap(), "xn--mnchen-3ya.de");
    }

    #[test]
    fn hostname_ipv6_unbracketed() {
        assert_eq!(hostname_of("http://[::1]:8080/").unwrap(), "::1");
    }

    #[test]
    fn hostname_empty() {
        assert!(matches!(
            hostname_of("   "),
            Err(ToolboxError::ValidationError(_))
        ));
    }

    #[test]
    fn hostname_invalid() {
        assert!(matches!(
            hostname_of("https://"),
            Err(ToolboxError::ValidationError(_))
        ));
    }
}
