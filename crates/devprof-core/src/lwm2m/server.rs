// ── LwM2M server security editor ──
//
// Working state for one server (or bootstrap server) entry of a device
// profile. Selecting a security mode fetches platform defaults for that
// mode and re-derives the key rules; edits flow through a three-state
// propagation filter before reaching the registered listener.

use std::fmt;
use std::future::Future;

use tracing::{debug, trace};
use url::Url;

use devprof_api::PlatformClient;
use devprof_api::types::{SecurityMode, ServerSecurityConfig};

use super::{
    DEFAULT_CLIENT_HOLD_OFF_TIME, DEFAULT_ID_SERVER, DEFAULT_PORT_BOOTSTRAP_NO_SEC,
    DEFAULT_PORT_SERVER_NO_SEC, LEN_MAX_PUBLIC_KEY_RPK, LEN_MAX_PUBLIC_KEY_X509,
};
use crate::validation::{Pattern, Rule, ValidationErrors};

// ── Collaborators ────────────────────────────────────────────────────

/// Supplies the host a new server entry points at.
pub trait HostResolver {
    fn default_host(&self) -> String;
}

impl HostResolver for str {
    fn default_host(&self) -> String {
        self.to_owned()
    }
}

impl HostResolver for String {
    fn default_host(&self) -> String {
        self.clone()
    }
}

/// The platform's own address: LwM2M servers are co-located with it.
impl HostResolver for Url {
    fn default_host(&self) -> String {
        self.host_str().unwrap_or_default().to_owned()
    }
}

/// Source of per-mode server defaults.
pub trait BootstrapDefaults {
    type Error;

    fn fetch_bootstrap_defaults(
        &self,
        mode: SecurityMode,
        bootstrap_server_is: bool,
    ) -> impl Future<Output = Result<ServerSecurityConfig, Self::Error>>;
}

impl BootstrapDefaults for PlatformClient {
    type Error = devprof_api::Error;

    async fn fetch_bootstrap_defaults(
        &self,
        mode: SecurityMode,
        bootstrap_server_is: bool,
    ) -> Result<ServerSecurityConfig, Self::Error> {
        self.get_lwm2m_bootstrap_security_info(mode, bootstrap_server_is)
            .await
    }
}

// ── Model ────────────────────────────────────────────────────────────

/// Ticket for one outstanding defaults fetch.
///
/// Only the most recently issued ticket may be applied; responses to older
/// ones are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultsRequest {
    pub seq: u64,
    pub mode: SecurityMode,
    pub bootstrap_server_is: bool,
}

/// Propagation filter state.
///
/// `Init` swallows the first notification, `Primed` captures the second as
/// baseline, `Active` forwards every notification that differs from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropagationState {
    #[default]
    Init,
    Primed,
    Active,
}

/// Outcome of a change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Filtered out: still priming, disabled, or equal to the baseline.
    Unchanged,
    /// Propagated a valid configuration.
    Valid(ServerSecurityConfig),
    /// Propagated the "invalid, do not persist" marker.
    Invalid,
}

type ChangeListener = Box<dyn FnMut(Option<&ServerSecurityConfig>) + Send>;

pub struct SecurityConfigModel {
    value: ServerSecurityConfig,
    bootstrap_server_is: bool,
    required: bool,
    disabled: bool,
    key_rules: Vec<Rule>,
    last_mode: Option<SecurityMode>,
    state: PropagationState,
    baseline: Option<ServerSecurityConfig>,
    latest_request: u64,
    listener: Option<ChangeListener>,
}

impl fmt::Debug for SecurityConfigModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfigModel")
            .field("value", &self.value)
            .field("required", &self.required)
            .field("disabled", &self.disabled)
            .field("state", &self.state)
            .field("latest_request", &self.latest_request)
            .finish_non_exhaustive()
    }
}

impl SecurityConfigModel {
    /// Fresh entry for the given role: NoSec, role port, resolver host.
    pub fn initialize<R: HostResolver + ?Sized>(
        bootstrap_server_is: bool,
        required: bool,
        hosts: &R,
    ) -> Self {
        let port = if bootstrap_server_is {
            DEFAULT_PORT_BOOTSTRAP_NO_SEC
        } else {
            DEFAULT_PORT_SERVER_NO_SEC
        };
        let value = ServerSecurityConfig {
            host: hosts.default_host(),
            port: Some(port),
            bootstrap_server_is,
            security_mode: SecurityMode::NoSec,
            server_public_key: String::new(),
            client_hold_off_time: Some(DEFAULT_CLIENT_HOLD_OFF_TIME),
            server_id: Some(DEFAULT_ID_SERVER),
            bootstrap_server_account_timeout: None,
        };
        Self {
            value,
            bootstrap_server_is,
            required,
            disabled: false,
            key_rules: base_rules(required).to_vec(),
            last_mode: None,
            state: PropagationState::Init,
            baseline: None,
            latest_request: 0,
            listener: None,
        }
    }

    pub fn value(&self) -> &ServerSecurityConfig {
        &self.value
    }

    pub fn bootstrap_server_is(&self) -> bool {
        self.bootstrap_server_is
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn state(&self) -> PropagationState {
        self.state
    }

    /// Rules currently applied to `serverPublicKey`.
    pub fn key_rules(&self) -> &[Rule] {
        &self.key_rules
    }

    /// Listener receiving propagated values; `None` means "invalid".
    pub fn register_on_change(
        &mut self,
        listener: impl FnMut(Option<&ServerSecurityConfig>) + Send + 'static,
    ) {
        self.listener = Some(Box::new(listener));
    }

    /// Load a stored entry without notifying anyone.
    ///
    /// The role always comes from this model, whatever the stored entry says.
    pub fn write_value(&mut self, mut config: ServerSecurityConfig) {
        config.bootstrap_server_is = self.bootstrap_server_is;
        self.value = config;
        self.derive_key_rules(self.value.security_mode);
    }

    /// Apply a user edit to the plain fields, then notify.
    ///
    /// Mode and role are not editable here; use [`Self::set_security_mode`].
    pub fn edit(&mut self, f: impl FnOnce(&mut ServerSecurityConfig)) -> Change {
        let mode = self.value.security_mode;
        f(&mut self.value);
        self.value.security_mode = mode;
        self.value.bootstrap_server_is = self.bootstrap_server_is;
        self.propagate_if_changed()
    }

    /// Select a security mode. Returns the defaults request to fulfil when
    /// the mode actually changed.
    pub fn set_security_mode(&mut self, mode: SecurityMode) -> Option<DefaultsRequest> {
        let previous = self.last_mode.replace(mode);
        self.value.security_mode = mode;
        self.on_security_mode_change(previous, mode)
    }

    /// React to a mode transition: issue a defaults request, re-derive the
    /// key rules, revalidate. No-op when the mode did not change.
    pub fn on_security_mode_change(
        &mut self,
        previous: Option<SecurityMode>,
        current: SecurityMode,
    ) -> Option<DefaultsRequest> {
        if previous == Some(current) {
            return None;
        }
        self.latest_request += 1;
        let request = DefaultsRequest {
            seq: self.latest_request,
            mode: current,
            bootstrap_server_is: self.bootstrap_server_is,
        };
        debug!(
            ?previous,
            %current,
            seq = request.seq,
            bootstrap = self.bootstrap_server_is,
            "security mode changed"
        );
        self.derive_key_rules(current);
        self.propagate_if_changed();
        Some(request)
    }

    /// Merge the response to `request` if it is still the latest one.
    pub fn apply_defaults(
        &mut self,
        request: &DefaultsRequest,
        defaults: ServerSecurityConfig,
    ) -> bool {
        if request.seq != self.latest_request {
            debug!(
                seq = request.seq,
                latest = self.latest_request,
                mode = %request.mode,
                "dropping stale bootstrap defaults"
            );
            return false;
        }
        self.merge_server_defaults(defaults);
        true
    }

    /// Overwrite the server fields with platform defaults and notify.
    pub fn merge_server_defaults(&mut self, defaults: ServerSecurityConfig) -> Change {
        self.value.host = defaults.host;
        self.value.port = defaults.port;
        self.value.server_public_key = defaults.server_public_key;
        self.value.client_hold_off_time = defaults.client_hold_off_time;
        self.value.server_id = defaults.server_id;
        self.value.bootstrap_server_account_timeout = defaults.bootstrap_server_account_timeout;
        self.propagate_if_changed()
    }

    /// Select `mode` and, if that issued a request, fetch and merge its
    /// defaults.
    pub async fn change_security_mode<S: BootstrapDefaults + ?Sized>(
        &mut self,
        source: &S,
        mode: SecurityMode,
    ) -> Result<bool, S::Error> {
        let Some(request) = self.set_security_mode(mode) else {
            return Ok(false);
        };
        let defaults = source
            .fetch_bootstrap_defaults(request.mode, request.bootstrap_server_is)
            .await?;
        Ok(self.apply_defaults(&request, defaults))
    }

    /// Run the propagation filter against the current value.
    pub fn propagate_if_changed(&mut self) -> Change {
        if self.disabled {
            return Change::Unchanged;
        }
        match self.state {
            PropagationState::Init => {
                self.state = PropagationState::Primed;
                trace!("propagation primed");
                Change::Unchanged
            }
            PropagationState::Primed => {
                self.baseline = Some(self.value.clone());
                self.state = PropagationState::Active;
                trace!("propagation baseline captured");
                Change::Unchanged
            }
            PropagationState::Active => {
                if self.baseline.as_ref() == Some(&self.value) {
                    return Change::Unchanged;
                }
                self.baseline = Some(self.value.clone());
                let change = if self.is_valid() {
                    Change::Valid(self.value.clone())
                } else {
                    Change::Invalid
                };
                if let Some(listener) = self.listener.as_mut() {
                    match &change {
                        Change::Valid(config) => listener(Some(config)),
                        _ => listener(None),
                    }
                }
                change
            }
        }
    }

    /// Disabling suspends validation and propagation; either direction
    /// restarts the propagation filter.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        self.state = PropagationState::Init;
        self.baseline = None;
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.disabled {
            return errors;
        }
        let base = base_rules(self.required);
        let v = &self.value;
        errors.check("host", Some(&v.host), base);
        errors.check("port", v.port.map(|p| p.to_string()).as_deref(), base);
        errors.check("serverPublicKey", Some(&v.server_public_key), &self.key_rules);
        errors.check(
            "clientHoldOffTime",
            v.client_hold_off_time.map(|t| t.to_string()).as_deref(),
            base,
        );
        errors.check("serverId", v.server_id.map(|id| id.to_string()).as_deref(), base);
        errors.check(
            "bootstrapServerAccountTimeout",
            v.bootstrap_server_account_timeout
                .map(|t| t.to_string())
                .as_deref(),
            base,
        );
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    fn derive_key_rules(&mut self, mode: SecurityMode) {
        self.key_rules = match mode {
            SecurityMode::NoSec | SecurityMode::Psk => Vec::new(),
            SecurityMode::Rpk => key_rules(LEN_MAX_PUBLIC_KEY_RPK, LEN_MAX_PUBLIC_KEY_RPK),
            SecurityMode::X509 => key_rules(0, LEN_MAX_PUBLIC_KEY_X509),
        };
    }
}

fn base_rules(required: bool) -> &'static [Rule] {
    if required { &[Rule::Required] } else { &[] }
}

fn key_rules(min: usize, max: usize) -> Vec<Rule> {
    vec![
        Rule::Required,
        Rule::Pattern(Pattern::HexDec),
        Rule::MinLength(min),
        Rule::MaxLength(max),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    use super::*;

    fn model(bootstrap: bool, required: bool) -> SecurityConfigModel {
        SecurityConfigModel::initialize(bootstrap, required, "lwm2m.example.com")
    }

    fn rpk_key() -> String {
        "a".repeat(LEN_MAX_PUBLIC_KEY_RPK)
    }

    /// Run the filter through `Init` and `Primed`.
    fn activate(m: &mut SecurityConfigModel) {
        assert_eq!(m.propagate_if_changed(), Change::Unchanged);
        assert_eq!(m.propagate_if_changed(), Change::Unchanged);
        assert_eq!(m.state(), PropagationState::Active);
    }

    struct FixedDefaults(ServerSecurityConfig);

    impl BootstrapDefaults for FixedDefaults {
        type Error = std::convert::Infallible;

        async fn fetch_bootstrap_defaults(
            &self,
            mode: SecurityMode,
            bootstrap_server_is: bool,
        ) -> Result<ServerSecurityConfig, Self::Error> {
            Ok(ServerSecurityConfig {
                security_mode: mode,
                bootstrap_server_is,
                ..self.0.clone()
            })
        }
    }

    // ── Initialisation ──────────────────────────────────────────────

    #[test]
    fn initialize_uses_role_port_and_constants() {
        let server = model(false, true);
        assert_eq!(server.value().port, Some(DEFAULT_PORT_SERVER_NO_SEC));
        assert_eq!(server.value().host, "lwm2m.example.com");
        assert_eq!(server.value().security_mode, SecurityMode::NoSec);
        assert_eq!(server.value().server_id, Some(DEFAULT_ID_SERVER));
        assert_eq!(
            server.value().client_hold_off_time,
            Some(DEFAULT_CLIENT_HOLD_OFF_TIME)
        );
        assert_eq!(server.value().bootstrap_server_account_timeout, None);
        assert!(!server.bootstrap_server_is());

        let bootstrap = model(true, true);
        assert_eq!(bootstrap.value().port, Some(DEFAULT_PORT_BOOTSTRAP_NO_SEC));
        assert!(bootstrap.value().bootstrap_server_is);
    }

    #[test]
    fn host_from_platform_url() {
        let url: Url = "https://iot.example.org:8080/".parse().unwrap();
        let m = SecurityConfigModel::initialize(false, false, &url);
        assert_eq!(m.value().host, "iot.example.org");
    }

    #[test]
    fn required_toggles_base_rules() {
        let m = model(false, true);
        let errors = m.validate();
        assert!(errors.has("bootstrapServerAccountTimeout", "required"));
        assert!(errors.has("serverPublicKey", "required"));
        assert!(!errors.has_field("host"));

        let m = model(false, false);
        assert!(m.is_valid());
    }

    // ── Key rules per mode ──────────────────────────────────────────

    #[test]
    fn rpk_requires_exact_length() {
        let mut m = model(false, false);
        m.set_security_mode(SecurityMode::Rpk);

        m.edit(|c| c.server_public_key = "a".repeat(LEN_MAX_PUBLIC_KEY_RPK - 1));
        assert!(m.validate().has("serverPublicKey", "minlength"));

        m.edit(|c| c.server_public_key = "a".repeat(LEN_MAX_PUBLIC_KEY_RPK + 1));
        assert!(m.validate().has("serverPublicKey", "maxlength"));

        m.edit(|c| c.server_public_key = rpk_key());
        assert!(m.is_valid());

        m.edit(|c| c.server_public_key = "z".repeat(LEN_MAX_PUBLIC_KEY_RPK));
        assert!(m.validate().has("serverPublicKey", "pattern"));
    }

    #[test]
    fn x509_allows_up_to_max_length() {
        let mut m = model(false, false);
        m.set_security_mode(SecurityMode::X509);
        assert!(m.validate().has("serverPublicKey", "required"));

        m.edit(|c| c.server_public_key = "F".repeat(LEN_MAX_PUBLIC_KEY_X509));
        assert!(m.is_valid());

        m.edit(|c| c.server_public_key = "F".repeat(LEN_MAX_PUBLIC_KEY_X509 + 1));
        assert!(m.validate().has("serverPublicKey", "maxlength"));
    }

    #[test]
    fn nosec_to_psk_clears_key_rules() {
        let mut m = model(false, true);
        m.set_security_mode(SecurityMode::NoSec);
        m.set_security_mode(SecurityMode::Psk);
        assert!(m.key_rules().is_empty());
        assert!(!m.validate().has_field("serverPublicKey"));
    }

    #[test]
    fn write_value_forces_role_and_derives_rules() {
        let mut m = model(true, false);
        m.write_value(ServerSecurityConfig {
            host: "stored".into(),
            port: Some(5688),
            bootstrap_server_is: false,
            security_mode: SecurityMode::Rpk,
            ..ServerSecurityConfig::default()
        });
        assert!(m.value().bootstrap_server_is);
        assert_eq!(m.value().security_mode, SecurityMode::Rpk);
        assert!(m.key_rules().contains(&Rule::MinLength(LEN_MAX_PUBLIC_KEY_RPK)));
        assert_eq!(m.state(), PropagationState::Init);
    }

    // ── Mode transitions and defaults ───────────────────────────────

    #[test]
    fn first_selection_fires_even_for_nosec() {
        let mut m = model(false, false);
        let request = m.set_security_mode(SecurityMode::NoSec).unwrap();
        assert_eq!(request.mode, SecurityMode::NoSec);
        assert!(!request.bootstrap_server_is);
        assert!(m.set_security_mode(SecurityMode::NoSec).is_none());
    }

    #[test]
    fn stale_defaults_are_dropped() {
        let mut m = model(false, false);
        let psk = m.set_security_mode(SecurityMode::Psk).unwrap();
        let rpk = m.set_security_mode(SecurityMode::Rpk).unwrap();
        assert!(rpk.seq > psk.seq);

        let stale = ServerSecurityConfig {
            host: "psk-host".into(),
            ..ServerSecurityConfig::default()
        };
        assert!(!m.apply_defaults(&psk, stale));
        assert_eq!(m.value().host, "lwm2m.example.com");

        let fresh = ServerSecurityConfig {
            host: "rpk-host".into(),
            port: Some(5684),
            server_public_key: rpk_key(),
            ..ServerSecurityConfig::default()
        };
        assert!(m.apply_defaults(&rpk, fresh));
        assert_eq!(m.value().host, "rpk-host");
        assert_eq!(m.value().port, Some(5684));
    }

    #[test]
    fn merge_never_touches_mode_or_role() {
        let mut m = model(true, false);
        m.set_security_mode(SecurityMode::X509);
        m.merge_server_defaults(ServerSecurityConfig {
            host: "h".into(),
            port: Some(1),
            bootstrap_server_is: false,
            security_mode: SecurityMode::NoSec,
            server_public_key: "00".into(),
            client_hold_off_time: Some(7),
            server_id: Some(9),
            bootstrap_server_account_timeout: Some(3),
        });
        let v = m.value();
        assert_eq!(v.security_mode, SecurityMode::X509);
        assert!(v.bootstrap_server_is);
        assert_eq!(v.server_public_key, "00");
        assert_eq!(v.client_hold_off_time, Some(7));
        assert_eq!(v.server_id, Some(9));
        assert_eq!(v.bootstrap_server_account_timeout, Some(3));
    }

    #[tokio::test]
    async fn change_security_mode_fetches_and_merges() {
        let source = FixedDefaults(ServerSecurityConfig {
            host: "0.0.0.0".into(),
            port: Some(5686),
            server_public_key: rpk_key(),
            client_hold_off_time: Some(1),
            server_id: Some(111),
            bootstrap_server_account_timeout: Some(0),
            ..ServerSecurityConfig::default()
        });
        let mut m = model(true, true);

        assert!(m.change_security_mode(&source, SecurityMode::Rpk).await.unwrap());
        assert_eq!(m.value().server_id, Some(111));
        assert_eq!(m.value().security_mode, SecurityMode::Rpk);
        assert!(m.is_valid());

        assert!(!m.change_security_mode(&source, SecurityMode::Rpk).await.unwrap());
    }

    // ── Propagation ─────────────────────────────────────────────────

    #[test]
    fn propagation_suppresses_priming_and_duplicates() {
        let mut m = model(false, false);
        assert_eq!(m.edit(|c| c.host = "a".into()), Change::Unchanged);
        assert_eq!(m.state(), PropagationState::Primed);
        assert_eq!(m.edit(|_| {}), Change::Unchanged);
        assert_eq!(m.state(), PropagationState::Active);

        let change = m.edit(|c| c.host = "b".into());
        let Change::Valid(config) = change else {
            panic!("expected a valid change, got {change:?}");
        };
        assert_eq!(config.host, "b");
        assert_eq!(m.edit(|c| c.host = "b".into()), Change::Unchanged);
    }

    #[test]
    fn invalid_value_propagates_marker() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut m = model(false, true);
        m.register_on_change(move |v| sink.lock().unwrap().push(v.cloned()));
        activate(&mut m);

        assert_eq!(m.edit(|c| c.host = "other".into()), Change::Invalid);
        m.edit(|c| {
            c.server_public_key = "00".into();
            c.bootstrap_server_account_timeout = Some(0);
        });

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].is_none());
        assert_eq!(seen[1].as_ref().unwrap().host, "other");
    }

    #[test]
    fn disabled_model_never_propagates() {
        let mut m = model(false, false);
        activate(&mut m);
        m.set_disabled(true);
        assert_eq!(m.state(), PropagationState::Init);
        assert_eq!(m.edit(|c| c.host = "x".into()), Change::Unchanged);
        assert_eq!(m.edit(|c| c.host = "y".into()), Change::Unchanged);
        assert_eq!(m.edit(|c| c.host = "z".into()), Change::Unchanged);
        assert!(m.is_valid());

        m.set_disabled(false);
        assert_eq!(m.state(), PropagationState::Init);
        assert_eq!(m.edit(|c| c.host = "q".into()), Change::Unchanged);
    }
}
