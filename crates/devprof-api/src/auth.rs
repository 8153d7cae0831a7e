use secrecy::SecretString;
use serde::Deserialize;

/// Credentials for authenticating with the platform.
///
/// Each variant carries the secret material needed for its auth flow.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// A pre-issued JWT, sent as `X-Authorization: Bearer <token>`.
    Token(SecretString),

    /// Username + password, exchanged for a JWT via `POST /api/auth/login`.
    Password {
        username: String,
        password: SecretString,
    },
}

/// JWT pair returned by the login endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    pub token: SecretString,
    #[serde(default)]
    pub refresh_token: Option<SecretString>,
}
