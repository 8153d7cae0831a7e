// ── Device credentials editor ──
//
// One working copy of a device's credentials. Exactly one variant is
// active; its rule table is rebuilt whenever the variant changes, and
// the wire form is produced on demand by `serialize()`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use devprof_api::types::{DeviceCredentials, DeviceCredentialsType, EntityId};

use crate::lwm2m::{self, DEFAULT_END_POINT};
use crate::validation::{AT_LEAST_ONE, Pattern, Rule, ValidationErrors, at_least_one};

/// Longest access token the platform accepts.
pub const ACCESS_TOKEN_MAX_LEN: usize = 20;

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("MQTT basic credentials value is not valid JSON: {source}")]
    MalformedMqttBasic {
        #[source]
        source: serde_json::Error,
    },
}

/// The `{clientId, userName, password}` group of `MQTT_BASIC` credentials.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MqttBasicCredentials {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl MqttBasicCredentials {
    /// Compact JSON in wire key order: `clientId`, `userName`, `password`.
    pub fn to_json(&self) -> String {
        let field = |v: Option<&String>| v.map_or(Value::Null, |s| Value::from(s.as_str()));
        format!(
            r#"{{"clientId":{},"userName":{},"password":{}}}"#,
            field(self.client_id.as_ref()),
            field(self.user_name.as_ref()),
            field(self.password.as_ref())
        )
    }

    fn blank() -> Self {
        Self {
            client_id: Some(String::new()),
            user_name: Some(String::new()),
            password: Some(String::new()),
        }
    }
}

// ── Security dialog ──────────────────────────────────────────────────

/// What the LwM2M security editor is opened with.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityDialogRequest {
    pub config: Value,
    pub end_point: String,
}

/// What a confirmed editor hands back.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SecurityDialogResult {
    #[serde(rename = "jsonAllConfig")]
    pub config: Value,
    #[serde(rename = "endPoint")]
    pub end_point: Value,
}

/// Interactive editor for the LwM2M client security document.
///
/// `Ok(None)` means the user cancelled.
pub trait SecurityConfigEditor {
    type Error;

    fn edit(
        &mut self,
        request: SecurityDialogRequest,
    ) -> Result<Option<SecurityDialogResult>, Self::Error>;
}

/// An editor answer that carries nothing: `{}`, `[]`, `[{}]`, `""`, `null`.
fn is_empty_dialog_value(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => match items.as_slice() {
            [] => true,
            [Value::Object(only)] => only.is_empty(),
            _ => false,
        },
        Value::String(s) => s.is_empty(),
        Value::Null | Value::Bool(_) | Value::Number(_) => true,
    }
}

// ── Model ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialsModel {
    id: Option<EntityId>,
    device_id: Option<EntityId>,
    credentials_type: DeviceCredentialsType,
    credentials_id: Option<String>,
    credentials_value: Option<String>,
    basic: MqttBasicCredentials,
    basic_enabled: bool,
    id_rules: Vec<Rule>,
    value_rules: Vec<Rule>,
    user_name_rules: Vec<Rule>,
    disabled: bool,
}

impl Default for CredentialsModel {
    fn default() -> Self {
        Self::new(DeviceCredentialsType::default())
    }
}

impl CredentialsModel {
    /// Blank credentials of the given variant, seeded as if freshly selected.
    pub fn new(credentials_type: DeviceCredentialsType) -> Self {
        let mut model = Self {
            id: None,
            device_id: None,
            credentials_type,
            credentials_id: None,
            credentials_value: None,
            basic: MqttBasicCredentials::default(),
            basic_enabled: false,
            id_rules: Vec::new(),
            value_rules: Vec::new(),
            user_name_rules: Vec::new(),
            disabled: false,
        };
        model.set_variant(credentials_type);
        model
    }

    /// Load credentials as stored on the platform.
    pub fn from_credentials(raw: DeviceCredentials) -> Result<Self, CredentialsError> {
        let mut model = Self::new(raw.credentials_type);
        model.deserialize(raw)?;
        Ok(model)
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn credentials_type(&self) -> DeviceCredentialsType {
        self.credentials_type
    }

    pub fn credentials_id(&self) -> Option<&str> {
        self.credentials_id.as_deref()
    }

    pub fn credentials_value(&self) -> Option<&str> {
        self.credentials_value.as_deref()
    }

    /// The MQTT group, or `None` while another variant is active.
    pub fn mqtt_basic(&self) -> Option<&MqttBasicCredentials> {
        self.basic_enabled.then_some(&self.basic)
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// `true` when a non-empty password currently makes the user name
    /// mandatory.
    pub fn user_name_required(&self) -> bool {
        self.user_name_rules.contains(&Rule::Required)
    }

    // ── Mutation ────────────────────────────────────────────────────

    /// Switch the active variant and reset every working value.
    pub fn set_variant(&mut self, credentials_type: DeviceCredentialsType) {
        debug!(from = %self.credentials_type, to = %credentials_type, "credentials variant");
        self.credentials_type = credentials_type;
        self.credentials_id = None;
        self.credentials_value = (credentials_type == DeviceCredentialsType::Lwm2mCredentials)
            .then(lwm2m::default_security_config_pretty);
        self.basic = MqttBasicCredentials::blank();
        self.update_rules();
        self.password_changed();
    }

    /// Replace the working values with a stored record.
    ///
    /// `MQTT_BASIC` values are decoded into the basic group; a missing value
    /// leaves the group empty.
    pub fn deserialize(&mut self, raw: DeviceCredentials) -> Result<(), CredentialsError> {
        let basic = match (raw.credentials_type, raw.credentials_value.as_deref()) {
            (DeviceCredentialsType::MqttBasic, Some(text)) => serde_json::from_str(text)
                .map_err(|source| CredentialsError::MalformedMqttBasic { source })?,
            _ => MqttBasicCredentials::default(),
        };
        self.id = raw.id;
        self.device_id = raw.device_id;
        self.credentials_type = raw.credentials_type;
        self.credentials_id = raw.credentials_id;
        self.credentials_value = if raw.credentials_type == DeviceCredentialsType::MqttBasic {
            None
        } else {
            raw.credentials_value
        };
        self.basic = basic;
        self.update_rules();
        self.password_changed();
        Ok(())
    }

    pub fn set_credentials_id(&mut self, id: Option<String>) {
        self.credentials_id = id;
    }

    pub fn set_credentials_value(&mut self, value: Option<String>) {
        self.credentials_value = value;
    }

    /// Replace the whole MQTT group, re-evaluating the password dependency.
    pub fn set_mqtt_basic(&mut self, basic: MqttBasicCredentials) {
        self.basic = basic;
        self.password_changed();
    }

    pub fn set_password(&mut self, password: Option<String>) {
        self.basic.password = password;
        self.password_changed();
    }

    /// Re-derive the "non-empty password needs a user name" rule.
    pub fn password_changed(&mut self) {
        let has_password = self.basic.password.as_deref().is_some_and(|p| !p.is_empty());
        self.user_name_rules = if has_password {
            vec![Rule::Required]
        } else {
            Vec::new()
        };
    }

    /// Disabled credentials always validate; enabling rebuilds the rules.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if !disabled {
            self.update_rules();
            self.password_changed();
        }
    }

    /// Hand the LwM2M document to `editor` and merge a confirmed answer.
    ///
    /// Returns `true` when the editor confirmed.
    pub fn open_security_dialog<E: SecurityConfigEditor + ?Sized>(
        &mut self,
        editor: &mut E,
    ) -> Result<bool, E::Error> {
        let request = SecurityDialogRequest {
            config: lwm2m::parse_or_default(self.credentials_value.as_deref()),
            end_point: self
                .credentials_id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| DEFAULT_END_POINT.to_owned()),
        };
        let Some(result) = editor.edit(request)? else {
            debug!("security dialog cancelled");
            return Ok(false);
        };
        self.credentials_value =
            (!is_empty_dialog_value(&result.config)).then(|| result.config.to_string());
        self.credentials_id = (!is_empty_dialog_value(&result.end_point))
            .then(|| result.end_point.to_string().replace('"', ""));
        Ok(true)
    }

    // ── Output ──────────────────────────────────────────────────────

    /// Wire form of the active variant.
    pub fn serialize(&self) -> DeviceCredentials {
        let (credentials_id, credentials_value) =
            if self.credentials_type == DeviceCredentialsType::MqttBasic {
                (None, Some(self.basic.to_json()))
            } else {
                (self.credentials_id.clone(), self.credentials_value.clone())
            };
        DeviceCredentials {
            id: self.id.clone(),
            device_id: self.device_id.clone(),
            credentials_type: self.credentials_type,
            credentials_id,
            credentials_value,
        }
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.disabled {
            return errors;
        }
        errors.check("credentialsId", self.credentials_id.as_deref(), &self.id_rules);
        errors.check(
            "credentialsValue",
            self.credentials_value.as_deref(),
            &self.value_rules,
        );
        if self.basic_enabled {
            let b = &self.basic;
            errors.check(
                "credentialsBasic.clientId",
                b.client_id.as_deref(),
                &[Rule::Pattern(Pattern::Alphanumeric)],
            );
            errors.check(
                "credentialsBasic.userName",
                b.user_name.as_deref(),
                &self.user_name_rules,
            );
            if !at_least_one([b.client_id.as_deref(), b.user_name.as_deref()]) {
                errors.add("credentialsBasic", AT_LEAST_ONE);
            }
        }
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    fn update_rules(&mut self) {
        let (id_rules, value_rules, basic_enabled) = match self.credentials_type {
            DeviceCredentialsType::AccessToken => (
                vec![
                    Rule::Required,
                    Rule::MinLength(1),
                    Rule::MaxLength(ACCESS_TOKEN_MAX_LEN),
                ],
                Vec::new(),
                false,
            ),
            DeviceCredentialsType::X509Certificate => (Vec::new(), vec![Rule::Required], false),
            DeviceCredentialsType::Lwm2mCredentials => (
                Vec::new(),
                vec![Rule::Required, Rule::Lwm2mSecurityConfig],
                false,
            ),
            DeviceCredentialsType::MqttBasic => (Vec::new(), Vec::new(), true),
        };
        self.id_rules = id_rules;
        self.value_rules = value_rules;
        self.basic_enabled = basic_enabled;
    }
}
