// ── Runtime dashboard configuration ──
//
// Describes *where* the backend lives and how the runtime should pace
// itself. Never touches disk: `tailrelay-config` (or a test) builds a
// `DashboardConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use tailrelay_api::transport::{TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed dashboards).
    DangerAcceptInvalid,
}

/// Configuration for a single dashboard instance.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Web UI base URL (e.g. `http://tailrelay:8021`).
    pub url: Url,
    pub tls: TlsVerification,
    /// Per-request timeout for REST calls.
    pub timeout: Duration,
    /// Raw `Cookie` header for the web UI session, if auth is enabled.
    pub session_cookie: Option<SecretString>,
    /// Period of the background refresh. Zero disables the timer.
    pub refresh_interval: Duration,
    /// Start the log tail alongside the refresh loop.
    pub log_stream_enabled: bool,
    /// Pause between log stream reconnect attempts. Zero retries at once.
    pub reconnect_delay: Duration,
}

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15);

impl DashboardConfig {
    /// Defaults for everything but the URL: 30 s timeout, 15 s refresh,
    /// log stream on, immediate reconnect.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            session_cookie: None,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            log_stream_enabled: true,
            reconnect_delay: Duration::ZERO,
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
            session_cookie: self.session_cookie.clone(),
        }
    }
}
