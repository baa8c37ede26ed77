//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use sybil_config::ConfigError;
use sybil_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the Sybil backend at {url}")]
    #[diagnostic(
        code(sybil::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             Reason: {reason}\n\
             Override the address with --api-url or SYBIL_API_URL."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(sybil::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout,

    // ── Session ──────────────────────────────────────────────────────
    #[error("Not logged in")]
    #[diagnostic(code(sybil::not_logged_in), help("Run: sybil login"))]
    NotLoggedIn,

    #[error("Session expired")]
    #[diagnostic(
        code(sybil::session_expired),
        help("The stored session was cleared. Run: sybil login")
    )]
    SessionExpired,

    #[error("Login failed: {message}")]
    #[diagnostic(
        code(sybil::auth_failed),
        help("Check the username and password for profile '{profile}'.")
    )]
    AuthFailed { profile: String, message: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(sybil::no_credentials),
        help(
            "Pass --password, set SYBIL_PASSWORD, or store one with:\n\
             sybil config set-password --profile {profile}"
        )
    )]
    NoCredentials { profile: String },

    // ── Backend ──────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(sybil::api_error))]
    Api { status: Option<u16>, message: String },

    #[error("Cannot {action}: {reason}")]
    #[diagnostic(
        code(sybil::action_unavailable),
        help("Pass --force to send the request anyway.")
    )]
    ActionUnavailable { action: String, reason: String },

    // ── Local ────────────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(sybil::validation))]
    Validation { field: String, reason: String },

    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(sybil::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error(transparent)]
    #[diagnostic(code(sybil::config))]
    Config(ConfigError),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(sybil::output))]
    Render(String),

    #[error("{0}")]
    #[diagnostic(code(sybil::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(sybil::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::NotLoggedIn
            | Self::SessionExpired
            | Self::AuthFailed { .. }
            | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Api { status, .. } => match status {
                Some(403) => exit_code::PERMISSION,
                Some(404) => exit_code::NOT_FOUND,
                Some(409) => exit_code::CONFLICT,
                _ => exit_code::GENERAL,
            },
            Self::ActionUnavailable { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::Config(ConfigError::NoCredentials { .. }) => exit_code::AUTH,
            Self::Config(ConfigError::Validation { .. }) => exit_code::USAGE,
            Self::Config(_) | Self::Render(_) | Self::Internal(_) | Self::Io(_) | Self::Json(_) => {
                exit_code::GENERAL
            }
        }
    }

    /// Attach the profile name to a rejected login.
    pub fn for_login(err: CoreError, profile: &str) -> Self {
        match err {
            CoreError::AuthenticationFailed { message } => Self::AuthFailed {
                profile: profile.into(),
                message,
            },
            other => other.into(),
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Timeout => Self::Timeout,
            CoreError::SessionExpired => Self::SessionExpired,
            CoreError::NotAuthenticated => Self::NotLoggedIn,
            CoreError::AuthenticationFailed { message } => Self::AuthFailed {
                profile: "default".into(),
                message,
            },
            CoreError::Api { status, message } => Self::Api { status, message },
            CoreError::Validation { field, reason } => Self::Validation { field, reason },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}
