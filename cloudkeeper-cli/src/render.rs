//! Plain-text rendering of records and audit entries.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use cloudkeeper_core::types::{AuditLogEntry, DomainRecord, DomainStatus, StorageConfig};

fn status_marker(status: DomainStatus) -> &'static str {
    match status {
        DomainStatus::Online => "●",
        DomainStatus::Offline => "○",
        DomainStatus::Checking => "…",
        DomainStatus::Unknown => "?",
    }
}

/// `lastChecked` as a UTC timestamp, `never` for 0.
pub fn last_checked(ms: i64) -> String {
    if ms <= 0 {
        return "never".to_string();
    }
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map_or_else(|| "invalid".to_string(), |dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

pub fn record_table(records: &[DomainRecord]) -> String {
    if records.is_empty() {
        return "No domains tracked yet. Add one with `cloudkeeper add <url>`.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<36}  {:<9} {:<28} {:<36} {}",
        "ID", "STATUS", "NAME", "URL", "CHECKED"
    );
    for r in records {
        let _ = writeln!(
            out,
            "{:<36}  {} {:<7} {:<28} {:<36} {}",
            r.id,
            status_marker(r.status),
            r.status,
            truncate(&r.name, 28),
            truncate(&r.url, 36),
            last_checked(r.last_checked)
        );
    }
    out
}

pub fn record_detail(r: &DomainRecord) -> String {
    let mut out = String::new();
    let field = |out: &mut String, label: &str, value: Option<&str>| {
        let _ = writeln!(out, "{label:<18}{}", value.unwrap_or("-"));
    };

    let _ = writeln!(out, "{} {}", status_marker(r.status), r.name);
    field(&mut out, "ID", Some(&r.id));
    field(&mut out, "URL", Some(&r.url));
    field(&mut out, "Status", Some(&r.status.to_string()));
    field(&mut out, "Last checked", Some(&last_checked(r.last_checked)));
    field(&mut out, "Description", r.description.as_deref());
    field(&mut out, "Owner", r.owner.as_deref());
    field(&mut out, "Registrar", r.registrar.as_deref());
    field(&mut out, "Registrar URL", r.registrar_url.as_deref());
    field(&mut out, "Registered", r.registration_date.as_deref());
    field(&mut out, "Expires", r.expires_at.as_deref());
    field(&mut out, "IP address", r.ip_address.as_deref());
    field(&mut out, "Location", r.location.as_deref());
    field(&mut out, "ISP", r.isp.as_deref());
    field(&mut out, "Favicon", r.favicon.as_deref());

    if let Some(ns) = r.nameservers.as_ref().filter(|ns| !ns.is_empty()) {
        field(&mut out, "Nameservers", Some(&ns.join(", ")));
    }
    if let Some(records) = r.dns_records.as_ref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "DNS records");
        for (kind, values) in records {
            for value in values {
                let _ = writeln!(out, "  {kind:<6} {value}");
            }
        }
    }
    out
}

pub fn audit_table(entries: &[AuditLogEntry]) -> String {
    if entries.is_empty() {
        return "No audit entries.\n".to_string();
    }
    let mut out = String::new();
    for e in entries {
        let details = e.details.as_ref().map(ToString::to_string).unwrap_or_default();
        let _ = writeln!(out, "{}  {:<5}  {}  {details}", e.timestamp, e.level, e.action);
    }
    out
}

pub fn storage(config: &StorageConfig) -> String {
    match (config.is_remote(), config.remote_url.as_deref()) {
        (true, Some(url)) => format!("remote ({url})\n"),
        (true, None) => "remote (not configured)\n".to_string(),
        (false, _) => "local\n".to_string(),
    }
}
