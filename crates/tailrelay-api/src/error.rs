use thiserror::Error;

/// Top-level error type for the `tailrelay-api` crate.
///
/// Covers every failure mode of the backend surface: transport, HTTP
/// status, payload decoding, and the log push stream. `tailrelay-core`
/// maps these into its own taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Backend ─────────────────────────────────────────────────────
    /// Non-2xx response. `message` is the response body text, or a
    /// generic `Request failed: <status>` when the body was empty.
    #[error("{message}")]
    Http { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A multipart part could not be built (bad file name or MIME type).
    #[error("Invalid upload: {0}")]
    Upload(String),

    // ── Push stream ─────────────────────────────────────────────────
    /// The log stream errored mid-flight.
    #[error("Log stream failed: {0}")]
    Stream(String),
}

impl Error {
    /// Build an [`Error::Http`] from a status and the raw response body.
    pub(crate) fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let trimmed = body.trim();
        let message = if trimmed.is_empty() {
            format!("Request failed: {}", status.as_u16())
        } else {
            trimmed.to_owned()
        };
        Self::Http {
            status: status.as_u16(),
            message,
        }
    }

    /// HTTP status code, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Stream(_) => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_falls_back_to_status_message() {
        let err = Error::from_status(reqwest::StatusCode::BAD_GATEWAY, "  \n");
        assert_eq!(err.to_string(), "Request failed: 502");
        assert_eq!(err.status(), Some(502));
        assert!(err.is_transient());
    }

    #[test]
    fn body_text_becomes_message() {
        let err = Error::from_status(reqwest::StatusCode::BAD_REQUEST, "port already in use\n");
        assert_eq!(err.to_string(), "port already in use");
        assert!(!err.is_transient());
        assert!(!err.is_not_found());
    }
}
