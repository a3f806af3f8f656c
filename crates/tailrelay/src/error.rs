//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a distinct exit code per failure class.

use miette::Diagnostic;
use thiserror::Error;

use tailrelay_config::ConfigError;
use tailrelay_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Backend ──────────────────────────────────────────────────────
    #[error("Could not reach the dashboard: {message}")]
    #[diagnostic(
        code(tailrelay::connection_failed),
        help(
            "Check that the tailrelay web UI is running and reachable.\n\
             Try: tailrelay list --url http://<host>:8021"
        )
    )]
    ConnectionFailed { message: String },

    #[error("Authentication required ({status})")]
    #[diagnostic(
        code(tailrelay::auth_failed),
        help(
            "The web UI rejected the session.\n\
             Pass --session-cookie, set TAILRELAY_SESSION_COOKIE, \
             or set session_cookie_env in your profile."
        )
    )]
    AuthFailed { status: u16 },

    #[error("{message}")]
    #[diagnostic(code(tailrelay::backend))]
    Backend { message: String, status: u16 },

    #[error("{message}")]
    #[diagnostic(code(tailrelay::stream), help("The log stream will need to be reopened."))]
    Stream { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(tailrelay::malformed_payload),
        help("The backend answered with data this version does not understand.")
    )]
    MalformedPayload { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(tailrelay::not_found),
        help("Run: tailrelay list to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    #[error("{message}")]
    #[diagnostic(code(tailrelay::busy), help("Wait for the pending request to finish."))]
    Busy { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("{reason}")]
    #[diagnostic(code(tailrelay::validation), help("Check the value of {field}."))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(tailrelay::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: tailrelay config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No dashboard URL configured")]
    #[diagnostic(
        code(tailrelay::no_config),
        help(
            "Create a profile with: tailrelay config init\n\
             Expected at: {path}\n\
             Or pass --url / set TAILRELAY_URL."
        )
    )]
    NoConfig { path: String },

    #[error("{0}")]
    #[diagnostic(code(tailrelay::config))]
    Config(String),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(tailrelay::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(tailrelay::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(tailrelay::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Stream { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::Backend { status: 404, .. } => exit_code::NOT_FOUND,
            Self::Busy { .. } | Self::Backend { status: 409, .. } => exit_code::CONFLICT,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Transport {
                status: Some(status @ (401 | 403)),
                ..
            } => CliError::AuthFailed { status },

            CoreError::Transport {
                message,
                status: Some(status),
            } => CliError::Backend { message, status },

            CoreError::Transport {
                message,
                status: None,
            } => CliError::ConnectionFailed { message },

            CoreError::Stream { .. } => CliError::Stream {
                message: err.to_string(),
            },

            CoreError::MalformedPayload { .. } => CliError::MalformedPayload {
                message: err.to_string(),
            },

            CoreError::Validation { field, message } => CliError::Validation {
                field: field.into(),
                reason: message,
            },

            CoreError::AlreadyInFlight { .. } => CliError::Busy {
                message: err.to_string(),
            },

            CoreError::NotFound { kind, id } => CliError::NotFound {
                resource_type: kind.to_string(),
                identifier: id.to_string(),
            },

            CoreError::Config { message } => CliError::Config(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(other.to_string()),
        }
    }
}
