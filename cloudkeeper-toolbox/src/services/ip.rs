//! IP geolocation lookup module.

use serde::Deserialize;

use crate::error::{ToolboxError, ToolboxResult};
use crate::types::GeoInfo;

/// Response structure from ipwho.is API.
#[derive(Deserialize)]
struct IpWhoisResponse {
    success: bool,
    message: Option<String>,
    country: Option<String>,
    city: Option<String>,
    isp: Option<String>,
    connection: Option<IpWhoisConnection>,
}

#[derive(Deserialize)]
struct IpWhoisConnection {
    isp: Option<String>,
}

/// Look up location and ISP for a single IP address.
pub async fn lookup_location(
    client: &reqwest::Client,
    endpoint: &str,
    ip: &str,
) -> ToolboxResult<GeoInfo> {
    let ip = ip.trim();
    if ip.parse::<std::net::IpAddr>().is_err() {
        return Err(ToolboxError::ValidationError(format!(
            "Invalid IP address: {ip}"
        )));
    }

    let url = format!("{}/{ip}", endpoint.trim_end_matches('/'));
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| ToolboxError::NetworkError(format!("Request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(ToolboxError::NetworkError(format!(
            "Geolocation lookup returned HTTP {}",
            response.status().as_u16()
        )));
    }

    let response: IpWhoisResponse = response
        .json()
        .await
        .map_err(|e| ToolboxError::ParseError(format!("Failed to parse response: {e}")))?;

    into_geo(response)
}

fn into_geo(response: IpWhoisResponse) -> ToolboxResult<GeoInfo> {
    if !response.success {
        let error_msg = match response.message.as_deref() {
            Some("You've hit the monthly limit") => {
                "IP lookup service monthly quota exceeded".to_string()
            }
            Some("Reserved range") => {
                "This IP belongs to a reserved range and cannot be looked up".to_string()
            }
            Some(msg) => format!("Lookup failed: {msg}"),
            None => "Lookup failed".to_string(),
        };
        return Err(ToolboxError::NetworkError(error_msg));
    }

    let location = match (response.city, response.country) {
        (Some(city), Some(country)) => Some(format!("{city}, {country}")),
        (None, Some(country)) => Some(country),
        (Some(city), None) => Some(city),
        (None, None) => None,
    };

    let isp = response
        .connection
        .and_then(|conn| conn.isp)
        .or(response.isp)
        .filter(|isp| !isp.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    Ok(GeoInfo {
        location,
        isp: Some(isp),
    })
}
