//! Reachability probe.

use std::time::Duration;

use crate::types::Reachability;

/// Prefix `https://` when the URL carries no HTTP scheme.
pub(crate) fn probe_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Send one GET with a bounded timeout.
///
/// The response body and status are ignored: any completed exchange counts as
/// online, any transport error as offline.
pub async fn check_status(client: &reqwest::Client, url: &str, timeout: Duration) -> Reachability {
    let target = probe_url(url);
    match client
        .get(&target)
        .header(reqwest::header::CACHE_CONTROL, "no-store")
        .timeout(timeout)
        .send()
        .await
    {
        Ok(response) => {
            log::debug!("Probe {target}: HTTP {}", response.status().as_u16());
            Reachability::Online
        }
        Err(e) => {
            log::debug!("Probe {target} failed: {e}");
            Reachability::Offline
        }
    }
}
