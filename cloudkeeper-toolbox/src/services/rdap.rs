//! RDAP registration lookup module.
//!
//! RDAP (RFC 9083) replaces free-form WHOIS text with JSON, so fields are read
//! structurally instead of by pattern matching.

use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;

use super::dns::normalize_nameserver;
use crate::error::{ToolboxError, ToolboxResult};
use crate::types::RdapInfo;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RdapDomain {
    #[serde(default)]
    events: Vec<RdapEvent>,
    #[serde(default)]
    entities: Vec<RdapEntity>,
    #[serde(default)]
    nameservers: Vec<RdapNameserver>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RdapEvent {
    event_action: String,
    event_date: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RdapEntity {
    #[serde(default)]
    roles: Vec<String>,
    vcard_array: Option<Value>,
    #[serde(default)]
    links: Vec<RdapLink>,
}

#[derive(Debug, Deserialize)]
struct RdapLink {
    rel: Option<String>,
    href: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RdapNameserver {
    ldh_name: Option<String>,
}

/// Query RDAP for a domain's registration data.
///
/// Registries only know registered names, so a 404 for `app.example.com`
/// is followed by a lookup of `example.com`.
pub async fn rdap_lookup(
    client: &reqwest::Client,
    endpoint: &str,
    host: &str,
) -> ToolboxResult<RdapInfo> {
    for candidate in lookup_candidates(host) {
        if let Some(info) = query_domain(client, endpoint, candidate).await? {
            return Ok(info);
        }
        log::debug!("RDAP has no record for {candidate}");
    }
    Err(ToolboxError::NetworkError(format!(
        "RDAP has no record for {host}"
    )))
}

/// The host itself, then each parent that still has at least two labels.
fn lookup_candidates(host: &str) -> Vec<&str> {
    let host = host.trim_end_matches('.');
    let mut candidates = vec![host];
    if host.parse::<std::net::IpAddr>().is_ok() {
        return candidates;
    }
    let mut rest = host;
    while let Some((_, parent)) = rest.split_once('.') {
        if !parent.contains('.') {
            break;
        }
        candidates.push(parent);
        rest = parent;
    }
    candidates
}

/// `Ok(None)` when the registry answers 404.
async fn query_domain(
    client: &reqwest::Client,
    endpoint: &str,
    domain: &str,
) -> ToolboxResult<Option<RdapInfo>> {
    let url = format!("{}/domain/{domain}", endpoint.trim_end_matches('/'));
    let response = client
        .get(&url)
        .header(reqwest::header::ACCEPT, "application/rdap+json")
        .send()
        .await
        .map_err(|e| ToolboxError::NetworkError(format!("RDAP query failed: {e}")))?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(ToolboxError::NetworkError(format!(
            "RDAP query for {domain} returned HTTP {}",
            status.as_u16()
        )));
    }

    let body: RdapDomain = response
        .json()
        .await
        .map_err(|e| ToolboxError::ParseError(format!("Invalid RDAP response: {e}")))?;

    Ok(Some(parse_rdap(body)))
}

fn parse_rdap(body: RdapDomain) -> RdapInfo {
    let registrar = body
        .entities
        .iter()
        .find(|e| e.roles.iter().any(|r| r.eq_ignore_ascii_case("registrar")));

    let registrar_name = registrar.and_then(|e| vcard_text(e.vcard_array.as_ref(), "fn"));
    let registrar_url = registrar.and_then(|e| {
        vcard_text(e.vcard_array.as_ref(), "url").or_else(|| {
            e.links
                .iter()
                .find(|l| l.rel.as_deref() == Some("about"))
                .map(|l| l.href.clone())
        })
    });

    let event_date = |action: &str| {
        body.events
            .iter()
            .find(|e| e.event_action.eq_ignore_ascii_case(action))
            .map(|e| normalize_date(&e.event_date))
    };

    let mut nameservers: Vec<String> = Vec::new();
    for ns in &body.nameservers {
        if let Some(name) = ns.ldh_name.as_deref() {
            let name = normalize_nameserver(name);
            if !name.is_empty() && !nameservers.contains(&name) {
                nameservers.push(name);
            }
        }
    }

    RdapInfo {
        registrar: registrar_name,
        registrar_url,
        registration_date: event_date("registration"),
        expires_at: event_date("expiration"),
        nameservers,
    }
}

/// Read a text property out of a jCard (`["vcard", [[name, {}, type, value], ...]]`).
fn vcard_text(vcard: Option<&Value>, property: &str) -> Option<String> {
    vcard?
        .get(1)?
        .as_array()?
        .iter()
        .filter_map(Value::as_array)
        .find(|prop| prop.first().and_then(Value::as_str) == Some(property))
        .and_then(|prop| prop.get(3))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Reduce an RFC 3339 timestamp to `YYYY-MM-DD`; unparseable input is kept.
fn normalize_date(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw.trim()).map_or_else(
        |_| raw.trim().to_string(),
        |dt| dt.format("%Y-%m-%d").to_string(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "objectClassName": "domain",
        "ldhName": "EXAMPLE.COM",
        "events": [
            {"eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z"},
            {"eventAction": "expiration", "eventDate": "2026-08-13T04:00:00Z"},
            {"eventAction": "last update of RDAP database", "eventDate": "2024-01-01T00:00:00Z"}
        ],
        "entities": [
            {
                "roles": ["registrar"],
                "vcardArray": ["vcard", [
                    ["version", {}, "text", "4.0"],
                    ["fn", {}, "text", "RESERVED-Internet Assigned Numbers Authority"]
                ]],
                "links": [{"rel": "about", "href": "http://www.iana.org"}]
            },
            {"roles": ["abuse"], "vcardArray": ["vcard", [["fn", {}, "text", "Abuse"]]]}
        ],
        "nameservers": [
            {"ldhName": "A.IANA-SERVERS.NET"},
            {"ldhName": "B.IANA-SERVERS.NET."}
        ]
    }"#;

    #[test]
    fn parses_registrar_dates_and_nameservers() {
        let info = parse_rdap(serde_json::from_str(SAMPLE).unwrap());
        assert_eq!(
            info.registrar.as_deref(),
            Some("RESERVED-Internet Assigned Numbers Authority")
        );
        assert_eq!(info.registrar_url.as_deref(), Some("http://www.iana.org"));
        assert_eq!(info.registration_date.as_deref(), Some("1995-08-14"));
        assert_eq!(info.expires_at.as_deref(), Some("2026-08-13"));
        assert_eq!(
            info.nameservers,
            vec!["a.iana-servers.net", "b.iana-servers.net"]
        );
    }

    #[test]
    fn empty_document_yields_empty_info() {
        let info = parse_rdap(serde_json::from_str("{}").unwrap());
        assert_eq!(info, RdapInfo::default());
    }

    #[test]
    fn candidates_walk_up_to_registered_name() {
        assert_eq!(
            lookup_candidates("a.b.example.co.uk"),
            vec!["a.b.example.co.uk", "b.example.co.uk", "example.co.uk", "co.uk"]
        );
        assert_eq!(lookup_candidates("example.com."), vec!["example.com"]);
        assert_eq!(lookup_candidates("localhost"), vec!["localhost"]);
        assert_eq!(lookup_candidates("192.0.2.1"), vec!["192.0.2.1"]);
    }

    #[test]
    fn non_rfc3339_date_is_kept() {
        assert_eq!(normalize_date("2020-01-01"), "2020-01-01");
        assert_eq!(normalize_date("2020-01-01T10:00:00+02:00"), "2020-01-01");
    }
}
