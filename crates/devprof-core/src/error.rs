// ── Core error types ──
//
// User-facing errors from devprof-core. Consumers never see HTTP status
// codes or JSON parse failures directly; the `From<devprof_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

use crate::credentials::CredentialsError;
use crate::validation::ValidationErrors;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to platform at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Platform request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {errors}")]
    Invalid { errors: ValidationErrors },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// Platform `errorCode` (e.g. 31 for bad request parameters).
        code: Option<u32>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<devprof_api::Error> for CoreError {
    fn from(err: devprof_api::Error) -> Self {
        use devprof_api::error::error_code;

        match err {
            devprof_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            devprof_api::Error::SessionExpired => CoreError::AuthenticationFailed {
                message: "Session expired -- log in again or refresh the token".into(),
            },
            devprof_api::Error::PermissionDenied { message } => {
                CoreError::PermissionDenied { message }
            }
            devprof_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            devprof_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            devprof_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            devprof_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            devprof_api::Error::RateLimited { message } => CoreError::Api {
                message: format!("Rate limited: {message}"),
                code: Some(error_code::TOO_MANY_REQUESTS),
                status: Some(429),
            },
            devprof_api::Error::Platform {
                message,
                error_code: Some(error_code::ITEM_NOT_FOUND),
                ..
            }
            | devprof_api::Error::Platform {
                message,
                status: 404,
                ..
            } => CoreError::NotFound {
                entity_type: "resource".into(),
                identifier: message,
            },
            devprof_api::Error::Platform {
                message,
                error_code: Some(error_code::INVALID_ARGUMENTS | error_code::BAD_REQUEST_PARAMS),
                ..
            } => CoreError::ValidationFailed { message },
            devprof_api::Error::Platform {
                message,
                error_code,
                status,
            } => CoreError::Api {
                message,
                code: error_code,
                status: Some(status),
            },
            devprof_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
