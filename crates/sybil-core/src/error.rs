// ── Core error types ──
//
// User-facing errors from sybil-core. View-models keep the last one whole,
// the dispatcher turns them into display strings, and the CLI maps them
// onto diagnostics and exit codes. The `From<sybil_api::Error>` impl keeps the four failure classes
// distinct: transport, backend detail, bare status, and expired session.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the Sybil backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    // ── Session errors ───────────────────────────────────────────────
    #[error("Session expired -- please log in again")]
    SessionExpired,

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("{message}")]
    AuthenticationFailed { message: String },

    // ── Backend errors ───────────────────────────────────────────────
    /// Message is the backend's `detail` verbatim, or `HTTP <status>`.
    #[error("{message}")]
    Api { status: Option<u16>, message: String },

    // ── Local errors ─────────────────────────────────────────────────
    #[error("Invalid input for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Whether the user has to log in (again) before this can succeed.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::NotAuthenticated)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<sybil_api::Error> for CoreError {
    fn from(err: sybil_api::Error) -> Self {
        match err {
            sybil_api::Error::SessionExpired => CoreError::SessionExpired,
            sybil_api::Error::NotAuthenticated => CoreError::NotAuthenticated,
            sybil_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            sybil_api::Error::Api { status, message } => CoreError::Api {
                status: Some(status),
                message,
            },
            sybil_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() || e.is_request() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.origin().ascii_serialization())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: "connection failed".into(),
                    }
                } else {
                    CoreError::Api {
                        status: e.status().map(|s| s.as_u16()),
                        message: e.to_string(),
                    }
                }
            }
            sybil_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            sybil_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            sybil_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Unexpected response: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_expiry_stays_distinct() {
        let err = CoreError::from(sybil_api::Error::SessionExpired);
        assert!(err.is_session_expired());
        assert!(err.requires_login());

        let err = CoreError::from(sybil_api::Error::Api {
            status: 401,
            message: "nope".into(),
        });
        assert!(!err.is_session_expired());
    }

    #[test]
    fn backend_detail_passes_through() {
        let err = CoreError::from(sybil_api::Error::Api {
            status: 409,
            message: "Pipeline already running".into(),
        });
        assert_eq!(err.to_string(), "Pipeline already running");
    }
}
