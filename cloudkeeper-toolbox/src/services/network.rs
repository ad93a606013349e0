//! Network detail aggregation.
//!
//! Stage one runs DoH resolution, the record dump and RDAP concurrently;
//! stage two geolocates the resolved IP. Every source is optional.

use super::dns::{dns_records, normalize_nameserver, resolve_ip};
use super::ip::lookup_location;
use super::rdap::rdap_lookup;
use super::{hostname_of, ToolboxConfig};
use crate::types::NetworkInfo;

pub async fn network_details(
    client: &reqwest::Client,
    config: &ToolboxConfig,
    url: &str,
) -> NetworkInfo {
    let host = match hostname_of(url) {
        Ok(host) => host,
        Err(e) => {
            log::debug!("Skipping network details: {e}");
            return NetworkInfo::default();
        }
    };

    let (ip, records, rdap) = futures::join!(
        resolve_ip(client, &config.doh_endpoint, &host),
        dns_records(client, &config.doh_endpoint, &host),
        rdap_lookup(client, &config.rdap_endpoint, &host),
    );

    let mut info = NetworkInfo::default();

    if let Some(ns) = records.get("NS") {
        info.nameservers = ns.iter().map(|n| normalize_nameserver(n)).collect();
    }
    info.dns_records = records;

    match ip {
        Ok(Some(ip)) => {
            match lookup_location(client, &config.geo_endpoint, &ip).await {
                Ok(geo) => info.merge_geo(geo),
                Err(e) => log::debug!("Geolocation for {ip} unavailable: {e}"),
            }
            info.ip_address = Some(ip);
        }
        Ok(None) => log::debug!("{host} has no A record"),
        Err(e) => log::debug!("Resolving {host} failed: {e}"),
    }

    match rdap {
        Ok(rdap) => info.merge_rdap(rdap),
        Err(e) => log::debug!("RDAP for {host} unavailable: {e}"),
    }

    info
}
