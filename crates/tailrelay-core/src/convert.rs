// ── Wire ↔ domain conversion ──
//
// The only place that knows both `tailrelay_api` wire shapes and the
// domain records. Full-record bodies for updates are rebuilt from the
// domain record, echoing back any fields the backend sent that we do
// not model.

use tailrelay_api::{Proxy, Relay, RelayStatus, TailscaleStatus};

use crate::model::{ProxyRecord, RecordId, RelayRecord, TailnetIdentity};

impl From<RelayStatus> for RelayRecord {
    fn from(status: RelayStatus) -> Self {
        let relay = status.relay;
        Self {
            id: RecordId::new(relay.id),
            listen_port: relay.listen_port,
            target_host: relay.target_host,
            target_port: relay.target_port,
            autostart: relay.autostart,
            enabled: relay.enabled,
            running: status.running,
            extra: relay.extra,
        }
    }
}

impl From<Proxy> for ProxyRecord {
    fn from(proxy: Proxy) -> Self {
        Self {
            id: RecordId::new(proxy.id),
            hostname: proxy.hostname,
            port: proxy.port,
            target: proxy.target,
            trusted_proxies: proxy.trusted_proxies,
            autostart: proxy.autostart,
            enabled: proxy.enabled,
            tls_cert_file: proxy.tls_cert_file,
            running: proxy.running,
            extra: proxy.extra,
        }
    }
}

impl From<TailscaleStatus> for TailnetIdentity {
    fn from(status: TailscaleStatus) -> Self {
        Self::new(status.magic_dns_name)
    }
}

/// Full relay body for a replace-style update.
pub(crate) fn relay_body(record: &RelayRecord) -> Relay {
    Relay {
        id: record.id.as_str().to_owned(),
        listen_port: record.listen_port,
        target_host: record.target_host.clone(),
        target_port: record.target_port,
        autostart: record.autostart,
        enabled: record.enabled,
        extra: record.extra.clone(),
    }
}

/// Full proxy body for a replace-style update.
pub(crate) fn proxy_body(record: &ProxyRecord) -> Proxy {
    Proxy {
        id: record.id.as_str().to_owned(),
        hostname: record.hostname.clone(),
        port: record.port,
        target: record.target.clone(),
        trusted_proxies: record.trusted_proxies,
        autostart: record.autostart,
        enabled: record.enabled,
        tls_cert_file: record.tls_cert_file.clone(),
        running: record.running,
        extra: record.extra.clone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn relay_round_trips_unknown_fields() {
        let status: RelayStatus = serde_json::from_value(json!({
            "Relay": {
                "id": "r1", "listen_port": 9000, "target_host": "h", "target_port": 80,
                "autostart": false, "enabled": true, "pid": 12
            },
            "Running": true
        }))
        .unwrap();
        let record = RelayRecord::from(status);
        assert!(record.running);

        let body = serde_json::to_value(relay_body(&record)).unwrap();
        assert_eq!(
            body,
            json!({
                "id": "r1", "listen_port": 9000, "target_host": "h", "target_port": 80,
                "autostart": false, "enabled": true, "pid": 12
            })
        );
    }

    #[test]
    fn relay_body_omits_enabled_the_backend_never_sent() {
        let status: RelayStatus = serde_json::from_value(json!({
            "relay": {
                "id": "r1", "listen_port": 9000, "target_host": "h", "target_port": 80,
                "autostart": false
            },
            "running": false
        }))
        .unwrap();
        let record = RelayRecord::from(status);
        assert_eq!(record.enabled, None);

        let body = serde_json::to_value(relay_body(&record)).unwrap();
        assert!(body.get("enabled").is_none());
    }

    #[test]
    fn identity_keeps_raw_fqdn() {
        let identity = TailnetIdentity::from(TailscaleStatus {
            magic_dns_name: "box.tailnet.ts.net.".into(),
            ..TailscaleStatus::default()
        });
        assert_eq!(identity.fqdn(), "box.tailnet.ts.net.");
        assert_eq!(identity.hostname(), "box.tailnet.ts.net");
    }
}
