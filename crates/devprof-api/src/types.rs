//! Wire types for the platform REST API.
//!
//! All types match the JSON bodies of the `/api/` endpoints.
//! Field names use camelCase via `#[serde(rename_all = "camelCase")]`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use uuid::Uuid;

// ── Identity ─────────────────────────────────────────────────────────

/// Typed entity reference, e.g. `{"entityType":"DEVICE_PROFILE","id":"…"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityId {
    pub entity_type: String,
    pub id: Uuid,
}

impl EntityId {
    pub fn new(entity_type: impl Into<String>, id: Uuid) -> Self {
        Self {
            entity_type: entity_type.into(),
            id,
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────

/// Sort direction for paged queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub property: String,
    pub direction: Direction,
}

impl SortOrder {
    pub fn new(property: impl Into<String>, direction: Direction) -> Self {
        Self {
            property: property.into(),
            direction,
        }
    }
}

/// Page request sent as query parameters on every list endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub page_size: u32,
    pub page: u32,
    pub text_search: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl PageLink {
    pub fn new(page_size: u32, page: u32) -> Self {
        Self {
            page_size,
            page,
            text_search: None,
            sort_order: None,
        }
    }

    pub fn with_text_search(mut self, text: impl Into<String>) -> Self {
        self.text_search = Some(text.into());
        self
    }

    pub fn with_sort(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    /// The same link advanced to the following page.
    pub fn next_page(&self) -> Self {
        Self {
            page: self.page + 1,
            ..self.clone()
        }
    }

    /// Render as `(name, value)` query pairs.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("pageSize", self.page_size.to_string()),
            ("page", self.page.to_string()),
        ];
        if let Some(ref text) = self.text_search {
            if !text.is_empty() {
                params.push(("textSearch", text.clone()));
            }
        }
        if let Some(ref sort) = self.sort_order {
            params.push(("sortProperty", sort.property.clone()));
            params.push(("sortOrder", sort.direction.to_string()));
        }
        params
    }
}

impl Default for PageLink {
    fn default() -> Self {
        Self::new(100, 0)
    }
}

/// Generic page wrapper returned by all list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData<T> {
    pub data: Vec<T>,
    pub total_pages: u32,
    pub total_elements: u64,
    pub has_next: bool,
}

// ── Device profiles ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum DeviceTransportType {
    #[serde(rename = "DEFAULT")]
    #[strum(serialize = "DEFAULT")]
    Default,
    #[serde(rename = "MQTT")]
    #[strum(serialize = "MQTT")]
    Mqtt,
    #[serde(rename = "COAP")]
    #[strum(serialize = "COAP")]
    Coap,
    #[serde(rename = "LWM2M")]
    #[strum(serialize = "LWM2M")]
    Lwm2m,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceProfileType {
    #[default]
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceProvisionType {
    #[default]
    Disabled,
    AllowCreateNewDevices,
    CheckPreProvisionedDevices,
}

/// Full device profile, from `GET /api/deviceProfile/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<EntityId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default: bool,
    #[serde(rename = "type", default)]
    pub profile_type: DeviceProfileType,
    pub transport_type: DeviceTransportType,
    #[serde(default)]
    pub provision_type: DeviceProvisionType,
    #[serde(default)]
    pub provision_device_key: Option<String>,
    #[serde(default)]
    pub default_rule_chain_id: Option<EntityId>,
    #[serde(default)]
    pub default_queue_name: Option<String>,
    #[serde(default)]
    pub firmware_id: Option<EntityId>,
    #[serde(default)]
    pub software_id: Option<EntityId>,
    /// Transport + alarm configuration, kept as opaque JSON.
    #[serde(default)]
    pub profile_data: Value,
    /// Catch-all for additional fields not modeled above.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Summary projection, from `GET /api/deviceProfileInfo/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfileInfo {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub default_dashboard_id: Option<EntityId>,
    #[serde(rename = "type", default)]
    pub profile_type: DeviceProfileType,
    pub transport_type: DeviceTransportType,
}

/// Which key set `GET /api/deviceProfile/devices/keys/{kind}` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DeviceKeyKind {
    Attributes,
    Timeseries,
}

// ── LwM2M ────────────────────────────────────────────────────────────

/// LwM2M security mode, as used in paths and bodies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum SecurityMode {
    #[default]
    #[serde(rename = "NO_SEC")]
    #[strum(to_string = "NO_SEC", serialize = "nosec")]
    NoSec,
    #[serde(rename = "PSK")]
    #[strum(serialize = "PSK")]
    Psk,
    #[serde(rename = "RPK")]
    #[strum(serialize = "RPK")]
    Rpk,
    #[serde(rename = "X509")]
    #[strum(serialize = "X509")]
    X509,
}

/// LwM2M server (or bootstrap server) security entry of a device profile.
///
/// Numeric fields are optional because a freshly initialised entry may leave
/// them blank until the platform's defaults arrive.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSecurityConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub bootstrap_server_is: bool,
    #[serde(default)]
    pub security_mode: SecurityMode,
    #[serde(default)]
    pub server_public_key: String,
    #[serde(default)]
    pub client_hold_off_time: Option<i64>,
    #[serde(default)]
    pub server_id: Option<i64>,
    #[serde(default)]
    pub bootstrap_server_account_timeout: Option<i64>,
}

/// LwM2M object model from the resource catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectLwM2M {
    pub id: i64,
    pub key_id: String,
    pub name: String,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub mandatory: bool,
    /// Instance/resource tree, kept as opaque JSON.
    #[serde(default)]
    pub instances: Vec<Value>,
}

// ── Device credentials ───────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum DeviceCredentialsType {
    #[default]
    #[serde(rename = "ACCESS_TOKEN")]
    #[strum(serialize = "ACCESS_TOKEN")]
    AccessToken,
    #[serde(rename = "X509_CERTIFICATE")]
    #[strum(serialize = "X509_CERTIFICATE")]
    X509Certificate,
    #[serde(rename = "MQTT_BASIC")]
    #[strum(serialize = "MQTT_BASIC")]
    MqttBasic,
    #[serde(rename = "LWM2M_CREDENTIALS")]
    #[strum(serialize = "LWM2M_CREDENTIALS")]
    Lwm2mCredentials,
}

/// Device credentials as exchanged with the platform.
///
/// For `MQTT_BASIC` the value is itself a JSON string encoding
/// `{clientId, userName, password}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<EntityId>,
    pub credentials_type: DeviceCredentialsType,
    #[serde(default)]
    pub credentials_id: Option<String>,
    #[serde(default)]
    pub credentials_value: Option<String>,
}

// ── Firmware ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum FirmwareType {
    #[default]
    Firmware,
    Software,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ChecksumAlgorithm {
    Md5,
    Sha256,
    Crc32,
}

impl ChecksumAlgorithm {
    /// Human-readable label for tables.
    pub fn label(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha256 => "SHA-256",
            Self::Crc32 => "CRC-32",
        }
    }
}

/// Firmware metadata, from `GET /api/firmware/info/{id}` and list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirmwareInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<EntityId>,
    #[serde(rename = "type", default)]
    pub firmware_type: FirmwareType,
    #[serde(default)]
    pub device_profile_id: Option<EntityId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub has_data: bool,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub checksum_algorithm: Option<ChecksumAlgorithm>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub data_size: Option<u64>,
    #[serde(default)]
    pub additional_info: Option<Value>,
}

/// Firmware with its payload (base64), from `GET /api/firmware/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Firmware {
    #[serde(flatten)]
    pub info: FirmwareInfo,
    #[serde(default)]
    pub data: Option<String>,
}

/// Raw firmware binary from `GET /api/firmware/{id}/download`.
#[derive(Debug, Clone)]
pub struct FirmwareDownload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: bytes::Bytes,
}
