use thiserror::Error;

/// Top-level error type for the `devprof-api` crate.
///
/// Covers every failure mode of the REST surface: authentication,
/// transport, structured platform errors, and body decoding.
/// `devprof-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, account locked, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The JWT was rejected or has expired.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    /// Authenticated, but the account lacks the required authority.
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Rate limited by the platform.
    #[error("Rate limited by the platform: {message}")]
    RateLimited { message: String },

    // ── Platform API ────────────────────────────────────────────────
    /// Structured error body (`{status, message, errorCode}`).
    #[error("Platform API error (HTTP {status}): {message}")]
    Platform {
        message: String,
        error_code: Option<u32>,
        status: u16,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

/// Platform error codes carried in the `errorCode` field.
pub mod error_code {
    pub const GENERAL: u32 = 2;
    pub const AUTHENTICATION: u32 = 10;
    pub const JWT_TOKEN_EXPIRED: u32 = 11;
    pub const CREDENTIALS_EXPIRED: u32 = 15;
    pub const PERMISSION_DENIED: u32 = 20;
    pub const INVALID_ARGUMENTS: u32 = 30;
    pub const BAD_REQUEST_PARAMS: u32 = 31;
    pub const ITEM_NOT_FOUND: u32 = 32;
    pub const TOO_MANY_REQUESTS: u32 = 33;
}

impl Error {
    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Platform { status: 404, .. } => true,
            Self::Platform {
                error_code: Some(code),
                ..
            } => *code == error_code::ITEM_NOT_FOUND,
            _ => false,
        }
    }

    /// Extract the platform error code, if available.
    pub fn platform_error_code(&self) -> Option<u32> {
        match self {
            Self::Platform { error_code, .. } => *error_code,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_by_status_or_code() {
        let by_status = Error::Platform {
            message: "missing".into(),
            error_code: None,
            status: 404,
        };
        let by_code = Error::Platform {
            message: "missing".into(),
            error_code: Some(error_code::ITEM_NOT_FOUND),
            status: 400,
        };
        assert!(by_status.is_not_found());
        assert!(by_code.is_not_found());
        assert!(!Error::SessionExpired.is_not_found());
    }
}
