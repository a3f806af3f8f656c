// Wire types for the web UI backend.
//
// These mirror the JSON the backend emits, including its mixed key casing
// (Go structs without tags serialize `Relay` / `Running`). Domain types
// live in `tailrelay-core`; conversion happens there.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumIter, EnumString};

// ── Relays ──────────────────────────────────────────────────────────

/// A socat TCP relay as stored by the backend.
///
/// Unknown fields are kept in `extra` so a full-record update sends back
/// everything the backend gave us.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relay {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub listen_port: u16,
    pub target_host: String,
    pub target_port: u16,
    #[serde(default)]
    pub autostart: bool,
    /// Absent when the backend omitted it; never sent back as a guess.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One entry of `GET /api/socat/relays`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayStatus {
    #[serde(alias = "Relay")]
    pub relay: Relay,
    #[serde(default, alias = "Running")]
    pub running: bool,
}

// ── Proxies ─────────────────────────────────────────────────────────

/// A Caddy HTTPS reverse proxy, with its runtime state inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proxy {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(
        default,
        deserialize_with = "zero_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub port: Option<u16>,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub trusted_proxies: bool,
    #[serde(default)]
    pub autostart: bool,
    #[serde(default)]
    pub enabled: bool,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub tls_cert_file: Option<String>,
    #[serde(default, alias = "Running")]
    pub running: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Multipart body for proxy create/update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyForm {
    /// Present on update only.
    pub id: Option<String>,
    pub hostname: String,
    pub port: u16,
    pub target: String,
    pub trusted_proxies: bool,
    pub autostart: bool,
    pub enabled: bool,
    pub tls_cert: Option<CertificateUpload>,
    pub remove_tls_cert: bool,
}

/// A certificate file attached to a proxy form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateUpload {
    pub file_name: String,
    pub contents: bytes::Bytes,
}

#[derive(Debug, Serialize)]
pub(crate) struct ToggleProxyRequest<'a> {
    pub id: &'a str,
    pub enabled: bool,
}

// ── Tailnet ─────────────────────────────────────────────────────────

/// Summary returned by `GET /api/tailscale/status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailscaleStatus {
    #[serde(
        default,
        rename = "MagicDNSName",
        alias = "magicDNSName",
        alias = "magic_dns_name"
    )]
    pub magic_dns_name: String,
    #[serde(default, rename = "Connected", alias = "connected")]
    pub connected: bool,
    #[serde(default, rename = "BackendState", alias = "backend_state")]
    pub backend_state: String,
}

// ── Logs ────────────────────────────────────────────────────────────

/// Backend log verbosity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// One structured log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub level: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub source: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Response of `GET /api/logs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LogSnapshot {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub logs: Vec<LogEntry>,
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SetLevelRequest {
    pub level: LogLevel,
}

/// Response of `POST /api/logs/level`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LevelResponse {
    #[serde(default)]
    pub level: Option<String>,
}

/// One decoded push-stream payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMessage {
    /// `{"connected": true}` greeting sent when the stream opens.
    Connected,
    Entry(LogEntry),
}

impl StreamMessage {
    /// Decode a single `data:` payload.
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(payload)?;
        if value
            .get("connected")
            .is_some_and(|c| c.as_bool().unwrap_or(!c.is_null()))
        {
            return Ok(Self::Connected);
        }
        serde_json::from_value(value).map(Self::Entry)
    }
}

// ── Serde helpers ───────────────────────────────────────────────────

fn zero_as_none<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u16>::deserialize(deserializer)?.filter(|p| *p != 0))
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Unparseable timestamps degrade to `None` instead of failing the entry.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok().map(|t| t.with_timezone(&Utc))))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn relay_status_accepts_both_key_casings() {
        let upper: RelayStatus = serde_json::from_value(json!({
            "Relay": {"id": "r1", "listen_port": 9000, "target_host": "h", "target_port": 80},
            "Running": true
        }))
        .unwrap();
        let lower: RelayStatus = serde_json::from_value(json!({
            "relay": {"id": "r1", "listen_port": 9000, "target_host": "h", "target_port": 80},
            "running": true
        }))
        .unwrap();
        assert_eq!(upper, lower);
        assert!(upper.running);
        assert!(!upper.relay.autostart);
    }

    #[test]
    fn relay_keeps_unknown_fields_for_round_trip() {
        let relay: Relay = serde_json::from_value(json!({
            "id": "r1", "listen_port": 9000, "target_host": "h", "target_port": 80,
            "autostart": true, "enabled": true, "pid": 4242
        }))
        .unwrap();
        assert_eq!(relay.extra.get("pid"), Some(&json!(4242)));
        let back = serde_json::to_value(&relay).unwrap();
        assert_eq!(back["pid"], json!(4242));
    }

    #[test]
    fn proxy_zero_port_and_empty_cert_are_absent() {
        let proxy: Proxy = serde_json::from_value(json!({
            "id": "p1", "hostname": "box.ts.net", "port": 0, "target": "http://localhost:3000",
            "tls_cert_file": "", "Running": true
        }))
        .unwrap();
        assert_eq!(proxy.port, None);
        assert_eq!(proxy.tls_cert_file, None);
        assert!(proxy.running);
    }

    #[test]
    fn tailscale_status_reads_magic_dns_name() {
        let status: TailscaleStatus = serde_json::from_value(json!({
            "Connected": true, "BackendState": "Running", "MagicDNSName": "box.tailnet.ts.net."
        }))
        .unwrap();
        assert_eq!(status.magic_dns_name, "box.tailnet.ts.net.");
        assert!(status.connected);

        let missing: TailscaleStatus = serde_json::from_value(json!({})).unwrap();
        assert!(missing.magic_dns_name.is_empty());
    }

    #[test]
    fn log_entry_tolerates_bad_timestamp() {
        let entry: LogEntry = serde_json::from_value(json!({
            "timestamp": "yesterday", "level": "INFO", "message": "hello"
        }))
        .unwrap();
        assert_eq!(entry.timestamp, None);
        assert_eq!(entry.source, None);
    }

    #[test]
    fn log_snapshot_null_logs_is_empty() {
        let snap: LogSnapshot = serde_json::from_str(r#"{"logs": null, "level": "DEBUG"}"#).unwrap();
        assert!(snap.logs.is_empty());
        assert_eq!(snap.level.as_deref(), Some("DEBUG"));
    }

    #[test]
    fn stream_message_distinguishes_greeting() {
        assert_eq!(
            StreamMessage::parse(r#"{"connected": true}"#).unwrap(),
            StreamMessage::Connected
        );
        let parsed = StreamMessage::parse(
            r#"{"timestamp":"2026-01-02T03:04:05Z","level":"WARN","source":"socat","message":"boom"}"#,
        )
        .unwrap();
        let StreamMessage::Entry(entry) = parsed else {
            panic!("expected entry");
        };
        assert_eq!(entry.source.as_deref(), Some("socat"));
        assert!(StreamMessage::parse("{not json").is_err());
        assert!(StreamMessage::parse("[1, 2]").is_err());
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        assert_eq!(LogLevel::from_str("warn").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::Debug.to_string(), "DEBUG");
        assert_eq!(serde_json::to_value(LogLevel::Error).unwrap(), json!("ERROR"));
    }
}
