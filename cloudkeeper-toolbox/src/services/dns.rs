//! DNS-over-HTTPS 查询模块

use std::net::Ipv4Addr;

use futures::future::join_all;
use serde::Deserialize;

use crate::error::{ToolboxError, ToolboxResult};
use crate::types::{DnsQueryType, DnsRecordMap};

/// JSON answer of a DoH `resolve` call (Google / Cloudflare dialect).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DohResponse {
    #[serde(default)]
    status: u32,
    #[serde(default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    data: String,
}

/// Query one record type and return the raw answer data.
async fn query(
    client: &reqwest::Client,
    endpoint: &str,
    host: &str,
    record_type: DnsQueryType,
) -> ToolboxResult<Vec<String>> {
    let url = format!("{}/resolve", endpoint.trim_end_matches('/'));
    let record_type = record_type.to_string();

    let response = client
        .get(&url)
        .header(reqwest::header::ACCEPT, "application/dns-json")
        .query(&[("name", host), ("type", record_type.as_str())])
        .send()
        .await
        .map_err(|e| ToolboxError::NetworkError(format!("DoH request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ToolboxError::NetworkError(format!(
            "DoH {record_type} query for {host} returned HTTP {}",
            status.as_u16()
        )));
    }

    let body: DohResponse = response
        .json()
        .await
        .map_err(|e| ToolboxError::ParseError(format!("Invalid DoH response: {e}")))?;

    // RCODE 3 (NXDOMAIN) and friends simply mean "no answer".
    if body.status != 0 {
        log::debug!("DoH {record_type} {host}: rcode {}", body.status);
    }

    Ok(body.answer.into_iter().map(|a| a.data).collect())
}

/// Resolve the first IPv4 address of a hostname.
///
/// CNAME links in the answer chain are skipped.
pub async fn resolve_ip(
    client: &reqwest::Client,
    endpoint: &str,
    host: &str,
) -> ToolboxResult<Option<String>> {
    let answers = query(client, endpoint, host, DnsQueryType::A).await?;
    Ok(answers
        .into_iter()
        .find(|data| data.parse::<Ipv4Addr>().is_ok()))
}

/// Dump every record type in [`DnsQueryType::DUMP`] concurrently.
///
/// Failed or empty types are left out of the map.
pub async fn dns_records(client: &reqwest::Client, endpoint: &str, host: &str) -> DnsRecordMap {
    let lookups = DnsQueryType::DUMP.iter().map(|&record_type| async move {
        (record_type, query(client, endpoint, host, record_type).await)
    });

    let mut records = DnsRecordMap::new();
    for (record_type, result) in join_all(lookups).await {
        match result {
            Ok(values) if !values.is_empty() => {
                records.insert(record_type.to_string(), values);
            }
            Ok(_) => {}
            Err(e) => log::debug!("Skipping {record_type} records for {host}: {e}"),
        }
    }
    records
}

/// Normalise a name server host: lowercase, no trailing root dot.
pub(crate) fn normalize_nameserver(name: &str) -> String {
    name.trim().trim_end_matches('.').to_lowercase()
}
