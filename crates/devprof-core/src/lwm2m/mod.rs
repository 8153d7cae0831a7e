//! LwM2M security configuration.
//!
//! Two halves: the client-side credentials document stored in a device's
//! `LWM2M_CREDENTIALS` value ([`client`]), and the server/bootstrap entries
//! edited inside a device profile ([`server`]).

pub mod client;
pub mod server;

pub use client::{
    BootstrapCredentials, ClientSecurityConfig, Lwm2mSecurityConfig, ServerCredentials,
    default_security_config, default_security_config_pretty, parse_or_default,
    validate_security_config,
};
pub use server::{
    BootstrapDefaults, Change, DefaultsRequest, HostResolver, PropagationState,
    SecurityConfigModel,
};

// ── Profile configuration constants ──────────────────────────────────

pub const DEFAULT_PORT_SERVER_NO_SEC: u16 = 5685;
pub const DEFAULT_PORT_BOOTSTRAP_NO_SEC: u16 = 5687;
pub const DEFAULT_ID_SERVER: i64 = 123;
pub const DEFAULT_CLIENT_HOLD_OFF_TIME: i64 = 1;

/// Exact length of a raw public key (hex encoded).
pub const LEN_MAX_PUBLIC_KEY_RPK: usize = 182;
/// Upper bound for an X.509 certificate (hex encoded).
pub const LEN_MAX_PUBLIC_KEY_X509: usize = 3000;

pub const KEY_REGEXP_HEX_DEC: &str = r"^[-+]?[0-9A-Fa-f]+\.?[0-9A-Fa-f]*$";

/// Endpoint name offered when a device has no credentials id yet.
pub const DEFAULT_END_POINT: &str = "default_client_lwm2m_end_point_no_sec";
