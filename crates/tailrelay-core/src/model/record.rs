use std::fmt;

use serde::Serialize;
use strum::{Display, EnumString};

/// Opaque backend identifier of a relay or proxy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Which collection a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Relay,
    Proxy,
}

impl ResourceKind {
    /// Capitalised noun for user-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Relay => "Relay",
            Self::Proxy => "Proxy",
        }
    }
}

/// A socat TCP relay plus its last-polled running state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelayRecord {
    pub id: RecordId,
    pub listen_port: u16,
    pub target_host: String,
    pub target_port: u16,
    pub autostart: bool,
    /// `None` when the backend did not report it.
    pub enabled: Option<bool>,
    pub running: bool,
    /// Backend fields this client does not model, echoed back on
    /// full-record updates.
    #[serde(skip)]
    pub(crate) extra: serde_json::Map<String, serde_json::Value>,
}

impl RelayRecord {
    /// `→ host:port`
    pub fn target_label(&self) -> String {
        format!("\u{2192} {}:{}", self.target_host, self.target_port)
    }
}

/// A Caddy HTTPS reverse proxy plus its last-polled running state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProxyRecord {
    pub id: RecordId,
    pub hostname: String,
    pub port: Option<u16>,
    pub target: String,
    pub trusted_proxies: bool,
    pub autostart: bool,
    pub enabled: bool,
    /// Server-side path of the uploaded certificate, if any. Read-only here.
    pub tls_cert_file: Option<String>,
    pub running: bool,
    #[serde(skip)]
    pub(crate) extra: serde_json::Map<String, serde_json::Value>,
}

impl ProxyRecord {
    /// `https://hostname[:port]`
    pub fn url(&self) -> String {
        match self.port {
            Some(port) => format!("https://{}:{port}", self.hostname),
            None => format!("https://{}", self.hostname),
        }
    }

    pub fn target_label(&self) -> String {
        format!("\u{2192} {}", self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy(port: Option<u16>) -> ProxyRecord {
        ProxyRecord {
            id: "p1".into(),
            hostname: "box.tailnet.ts.net".into(),
            port,
            target: "http://localhost:3000".into(),
            trusted_proxies: false,
            autostart: false,
            enabled: true,
            tls_cert_file: None,
            running: true,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn proxy_url_includes_port_only_when_set() {
        assert_eq!(proxy(None).url(), "https://box.tailnet.ts.net");
        assert_eq!(proxy(Some(8443)).url(), "https://box.tailnet.ts.net:8443");
        assert_eq!(proxy(None).target_label(), "\u{2192} http://localhost:3000");
    }

    #[test]
    fn kind_round_trips_through_strings() {
        assert_eq!(ResourceKind::Relay.to_string(), "relay");
        assert_eq!("proxy".parse::<ResourceKind>().ok(), Some(ResourceKind::Proxy));
        assert_eq!(ResourceKind::Proxy.label(), "Proxy");
    }
}
