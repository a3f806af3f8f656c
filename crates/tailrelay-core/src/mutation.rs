// ── Mutation requests ──
//
// Typed user actions routed through `Dashboard::dispatch`. Each carries
// what it needs to pass the client-side pre-flight checks and to build
// its single backend request.

use std::path::Path;

use bytes::Bytes;
use serde::Serialize;
use strum::{Display, EnumString};

use tailrelay_api::{CertificateUpload, ProxyForm, Relay};

use crate::error::CoreError;
use crate::inflight::InFlightKey;
use crate::model::{ProxyRecord, RecordId, RelayRecord, ResourceKind, TailnetIdentity};

/// Ports the backend keeps for itself (HTTP, HTTPS, web UI).
pub const RESERVED_PROXY_PORTS: [u16; 3] = [80, 443, 8021];

/// Accepted certificate file extensions (compared case-insensitively).
pub const CERTIFICATE_EXTENSIONS: [&str; 3] = ["pem", "crt", "cer"];

/// Largest certificate upload accepted, in bytes.
pub const MAX_CERTIFICATE_BYTES: usize = 1024 * 1024;

/// What a mutation does, independent of its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MutationAction {
    ToggleRun,
    SetAutostart,
    Create,
    Update,
    Delete,
}

impl MutationAction {
    /// Whether the local record is patched before the backend confirms.
    pub fn is_optimistic(self) -> bool {
        matches!(self, Self::ToggleRun | Self::SetAutostart)
    }
}

// ── Drafts ───────────────────────────────────────────────────────────

/// User-editable relay fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayDraft {
    pub listen_port: u16,
    pub target_host: String,
    pub target_port: u16,
    pub autostart: bool,
}

impl From<&RelayRecord> for RelayDraft {
    fn from(record: &RelayRecord) -> Self {
        Self {
            listen_port: record.listen_port,
            target_host: record.target_host.clone(),
            target_port: record.target_port,
            autostart: record.autostart,
        }
    }
}

impl RelayDraft {
    fn validate(&self) -> Result<(), CoreError> {
        let missing = if self.listen_port == 0 {
            Some("listen_port")
        } else if self.target_host.trim().is_empty() {
            Some("target_host")
        } else if self.target_port == 0 {
            Some("target_port")
        } else {
            None
        };
        match missing {
            Some(field) => Err(CoreError::validation(
                field,
                "Please fill in all required fields",
            )),
            None => Ok(()),
        }
    }

    /// Request body. Saving a relay always (re-)enables it.
    pub(crate) fn to_body(&self, id: Option<&RecordId>) -> Relay {
        Relay {
            id: id.map(|id| id.as_str().to_owned()).unwrap_or_default(),
            listen_port: self.listen_port,
            target_host: self.target_host.trim().to_owned(),
            target_port: self.target_port,
            autostart: self.autostart,
            enabled: Some(true),
            extra: serde_json::Map::new(),
        }
    }
}

/// A certificate chosen for upload with a proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateFile {
    pub file_name: String,
    pub contents: Bytes,
}

impl CertificateFile {
    /// Read a certificate from disk, keeping only its file name.
    pub fn read(path: &Path) -> Result<Self, CoreError> {
        let contents = std::fs::read(path).map_err(|e| {
            CoreError::validation("tls_cert", format!("Cannot read {}: {e}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            file_name,
            contents: Bytes::from(contents),
        })
    }

    fn validate(&self) -> Result<(), CoreError> {
        let extension_ok = Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                CERTIFICATE_EXTENSIONS
                    .iter()
                    .any(|allowed| ext.eq_ignore_ascii_case(allowed))
            });
        if !extension_ok {
            return Err(CoreError::validation(
                "tls_cert",
                "Invalid certificate file. Please upload a .pem, .crt, or .cer file.",
            ));
        }
        if self.contents.len() > MAX_CERTIFICATE_BYTES {
            return Err(CoreError::validation(
                "tls_cert",
                "Certificate file too large. Maximum size is 1MB.",
            ));
        }
        Ok(())
    }
}

/// User-editable proxy fields. The hostname is not here: it always comes
/// from the tailnet identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProxyDraft {
    pub target: String,
    pub port: Option<u16>,
    pub trusted_proxies: bool,
    pub autostart: bool,
    pub certificate: Option<CertificateFile>,
    pub remove_tls_cert: bool,
}

impl From<&ProxyRecord> for ProxyDraft {
    fn from(record: &ProxyRecord) -> Self {
        Self {
            target: record.target.clone(),
            port: record.port,
            trusted_proxies: record.trusted_proxies,
            autostart: record.autostart,
            certificate: None,
            remove_tls_cert: false,
        }
    }
}

impl ProxyDraft {
    fn validate(&self, identity: &TailnetIdentity) -> Result<(), CoreError> {
        if !identity.is_resolved() {
            return Err(CoreError::validation(
                "hostname",
                "MagicDNS hostname not available. Please ensure Tailscale is connected.",
            ));
        }
        if self.target.trim().is_empty() {
            return Err(CoreError::validation("target", "Please fill in the target URL"));
        }
        if let Some(cert) = &self.certificate {
            cert.validate()?;
        }
        match self.port {
            None | Some(0) => Err(CoreError::validation("port", "Port is required")),
            Some(port) if RESERVED_PROXY_PORTS.contains(&port) => Err(CoreError::validation(
                "port",
                "Ports 80, 443, and 8021 are reserved and cannot be used",
            )),
            Some(_) => Ok(()),
        }
    }

    /// Multipart form. Call only after `validate` succeeded.
    pub(crate) fn to_form(&self, id: Option<&RecordId>, identity: &TailnetIdentity) -> ProxyForm {
        ProxyForm {
            id: id.map(|id| id.as_str().to_owned()),
            hostname: identity.hostname().to_owned(),
            port: self.port.unwrap_or_default(),
            target: self.target.trim().to_owned(),
            trusted_proxies: self.trusted_proxies,
            autostart: self.autostart,
            enabled: true,
            tls_cert: self.certificate.as_ref().map(|c| CertificateUpload {
                file_name: c.file_name.clone(),
                contents: c.contents.clone(),
            }),
            remove_tls_cert: self.remove_tls_cert,
        }
    }
}

// ── Mutation ─────────────────────────────────────────────────────────

/// A user action against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Relay: start/stop. Proxy: enable/disable.
    ToggleRun { kind: ResourceKind, id: RecordId },
    SetAutostart {
        kind: ResourceKind,
        id: RecordId,
        autostart: bool,
    },
    CreateRelay(RelayDraft),
    UpdateRelay { id: RecordId, draft: RelayDraft },
    CreateProxy(ProxyDraft),
    UpdateProxy { id: RecordId, draft: ProxyDraft },
    Delete { kind: ResourceKind, id: RecordId },
}

impl Mutation {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::ToggleRun { kind, .. }
            | Self::SetAutostart { kind, .. }
            | Self::Delete { kind, .. } => *kind,
            Self::CreateRelay(_) | Self::UpdateRelay { .. } => ResourceKind::Relay,
            Self::CreateProxy(_) | Self::UpdateProxy { .. } => ResourceKind::Proxy,
        }
    }

    pub fn action(&self) -> MutationAction {
        match self {
            Self::ToggleRun { .. } => MutationAction::ToggleRun,
            Self::SetAutostart { .. } => MutationAction::SetAutostart,
            Self::CreateRelay(_) | Self::CreateProxy(_) => MutationAction::Create,
            Self::UpdateRelay { .. } | Self::UpdateProxy { .. } => MutationAction::Update,
            Self::Delete { .. } => MutationAction::Delete,
        }
    }

    /// Target record. `None` for creates.
    pub fn id(&self) -> Option<&RecordId> {
        match self {
            Self::ToggleRun { id, .. }
            | Self::SetAutostart { id, .. }
            | Self::UpdateRelay { id, .. }
            | Self::UpdateProxy { id, .. }
            | Self::Delete { id, .. } => Some(id),
            Self::CreateRelay(_) | Self::CreateProxy(_) => None,
        }
    }

    pub fn key(&self) -> InFlightKey {
        InFlightKey {
            kind: self.kind(),
            id: self.id().cloned(),
            action: self.action(),
        }
    }

    /// Client-side pre-flight checks. Never touches the network.
    pub fn validate(&self, identity: &TailnetIdentity) -> Result<(), CoreError> {
        match self {
            Self::CreateRelay(draft) | Self::UpdateRelay { draft, .. } => draft.validate(),
            Self::CreateProxy(draft) | Self::UpdateProxy { draft, .. } => {
                draft.validate(identity)
            }
            Self::ToggleRun { .. } | Self::SetAutostart { .. } | Self::Delete { .. } => Ok(()),
        }
    }

    /// Message shown after the backend accepted the change. Toggles are
    /// silent; the refreshed view is their confirmation.
    pub fn success_message(&self) -> Option<String> {
        let verb = match self.action() {
            MutationAction::Create => "created",
            MutationAction::Update => "updated",
            MutationAction::Delete => "deleted",
            MutationAction::ToggleRun | MutationAction::SetAutostart => return None,
        };
        Some(format!("{} {verb} successfully", self.kind().label()))
    }
}
