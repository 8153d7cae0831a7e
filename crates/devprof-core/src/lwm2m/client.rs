// ── LwM2M client credentials document ──
//
// Stored as JSON text in `credentialsValue` of `LWM2M_CREDENTIALS`
// device credentials. The transport reads `client.securityConfigClientMode`
// and `bootstrap.*.securityMode`; everything else is opaque here.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use devprof_api::types::SecurityMode;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSecurityConfig {
    pub security_config_client_mode: SecurityMode,
    pub endpoint: String,
    pub identity: String,
    pub key: String,
    pub x509: bool,
}

/// Credentials the device presents to one server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCredentials {
    pub security_mode: SecurityMode,
    pub client_public_key_or_id: String,
    pub client_secret_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapCredentials {
    pub bootstrap_server: ServerCredentials,
    pub lwm2m_server: ServerCredentials,
}

/// Full document: `{client, bootstrap: {bootstrapServer, lwm2mServer}}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Lwm2mSecurityConfig {
    pub client: ClientSecurityConfig,
    pub bootstrap: BootstrapCredentials,
}

/// NoSec everywhere, empty keys, empty endpoint.
pub fn default_security_config() -> Lwm2mSecurityConfig {
    Lwm2mSecurityConfig::default()
}

/// [`default_security_config`] as two-space indented JSON.
const DEFAULT_SECURITY_CONFIG_PRETTY: &str = r#"{
  "client": {
    "securityConfigClientMode": "NO_SEC",
    "endpoint": "",
    "identity": "",
    "key": "",
    "x509": false
  },
  "bootstrap": {
    "bootstrapServer": {
      "securityMode": "NO_SEC",
      "clientPublicKeyOrId": "",
      "clientSecretKey": ""
    },
    "lwm2mServer": {
      "securityMode": "NO_SEC",
      "clientPublicKeyOrId": "",
      "clientSecretKey": ""
    }
  }
}"#;

/// The default document as pretty JSON, the form seeded into a freshly
/// selected `LWM2M_CREDENTIALS` value.
pub fn default_security_config_pretty() -> String {
    DEFAULT_SECURITY_CONFIG_PRETTY.to_owned()
}

const REQUIRED_POINTERS: &[&str] = &[
    "/client",
    "/client/securityConfigClientMode",
    "/client/endpoint",
    "/client/identity",
    "/client/key",
    "/client/x509",
    "/bootstrap",
    "/bootstrap/bootstrapServer",
    "/bootstrap/bootstrapServer/securityMode",
    "/bootstrap/bootstrapServer/clientPublicKeyOrId",
    "/bootstrap/bootstrapServer/clientSecretKey",
    "/bootstrap/lwm2mServer",
    "/bootstrap/lwm2mServer/securityMode",
    "/bootstrap/lwm2mServer/clientPublicKeyOrId",
    "/bootstrap/lwm2mServer/clientSecretKey",
];

/// `true` when `text` is JSON containing every key of the document shape.
///
/// Values are not interpreted; `null` is an acceptable value for a present key.
pub fn validate_security_config(text: &str) -> bool {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return false;
    };
    REQUIRED_POINTERS
        .iter()
        .all(|pointer| value.pointer(pointer).is_some())
}

/// Parse a stored document, falling back to the default for empty or
/// unreadable input.
pub fn parse_or_default(text: Option<&str>) -> Value {
    let fallback = || serde_json::to_value(default_security_config()).unwrap_or(Value::Null);
    match text {
        None | Some("") => fallback(),
        Some(text) => serde_json::from_str(text).unwrap_or_else(|e| {
            debug!(error = %e, "unparseable LwM2M credentials, using defaults");
            fallback()
        }),
    }
}
