// ── Core error types ──
//
// The dashboard's failure taxonomy. Transport-level detail from
// `tailrelay-api` is folded into these variants by the `From` impl
// below; presenters only ever see `CoreError`.

use thiserror::Error;

use crate::model::{RecordId, ResourceKind};
use crate::mutation::MutationAction;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Backend ──────────────────────────────────────────────────────
    /// Non-2xx response or network failure on a REST call. `message` is
    /// what the user sees.
    #[error("{message}")]
    Transport {
        message: String,
        status: Option<u16>,
    },

    /// The log push connection errored or closed.
    #[error("Log stream error: {reason}")]
    Stream { reason: String },

    /// A response or stream frame could not be decoded.
    #[error("Malformed payload: {reason}")]
    MalformedPayload { reason: String },

    // ── Client-side guards ───────────────────────────────────────────
    /// A pre-flight check failed; nothing was sent.
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{kind} {id} already has a {action} in progress")]
    AlreadyInFlight {
        kind: ResourceKind,
        id: String,
        action: MutationAction,
    },

    #[error("{kind} not found: {id}")]
    NotFound { kind: ResourceKind, id: RecordId },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// HTTP status of the failed request, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// `true` for failures caught before any network I/O.
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::AlreadyInFlight { .. } | Self::NotFound { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tailrelay_api::Error> for CoreError {
    fn from(err: tailrelay_api::Error) -> Self {
        use tailrelay_api::Error as ApiError;

        match err {
            ApiError::Http { status, message } => CoreError::Transport {
                message,
                status: Some(status),
            },
            ApiError::Transport(ref e) => CoreError::Transport {
                message: err.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            ApiError::Deserialization { message, .. } => CoreError::MalformedPayload {
                reason: message,
            },
            ApiError::Stream(reason) => CoreError::Stream { reason },
            ApiError::Upload(message) => CoreError::Validation {
                field: "tls_cert",
                message,
            },
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Tls(message) => CoreError::Config { message },
        }
    }
}
