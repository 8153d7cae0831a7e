// ── Controller abstraction ──
//
// One authenticated session against the platform. Wraps `PlatformClient`,
// walks paginated listings to completion, maps transport errors into
// `CoreError`, and gates credential writes behind the rules engine.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use devprof_api::transport::{TlsMode, TransportConfig};
use devprof_api::types::{
    ChecksumAlgorithm, DeviceKeyKind, DeviceProfile, DeviceProfileInfo, DeviceTransportType,
    Firmware, FirmwareDownload, FirmwareInfo, FirmwareType, ObjectLwM2M, PageLink, SecurityMode,
    ServerSecurityConfig, SortOrder,
};
use devprof_api::{Credentials, PlatformClient};

use crate::config::{AuthCredentials, ControllerConfig, TlsVerification};
use crate::credentials::CredentialsModel;
use crate::error::CoreError;
use crate::lwm2m::BootstrapDefaults;

const LIST_PAGE_SIZE: u32 = 100;

/// The main entry point for consumers.
///
/// Cheaply cloneable; all clones share one HTTP connection pool.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    client: PlatformClient,
}

impl Controller {
    /// Authenticate and build a ready-to-use controller.
    pub async fn connect(config: ControllerConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let credentials = match &config.auth {
            AuthCredentials::Token(token) => Credentials::Token(token.clone()),
            AuthCredentials::Credentials { username, password } => {
                debug!(username = %username, "logging in with credentials");
                Credentials::Password {
                    username: username.clone(),
                    password: password.clone(),
                }
            }
        };
        let client = PlatformClient::connect(config.url.as_str(), &credentials, &transport).await?;
        info!(url = %config.url, "connected to platform");
        Ok(Self::with_client(config, client))
    }

    /// Wrap an already-authenticated client.
    pub fn with_client(config: ControllerConfig, client: PlatformClient) -> Self {
        Self {
            inner: Arc::new(ControllerInner { config, client }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &PlatformClient {
        &self.inner.client
    }

    // ── Device profiles ──────────────────────────────────────────────

    /// Every device profile, optionally filtered by name.
    pub async fn device_profiles(
        &self,
        search: Option<&str>,
        sort: Option<SortOrder>,
    ) -> Result<Vec<DeviceProfile>, CoreError> {
        let client = self.client();
        let first = page_link(search, sort);
        Ok(client
            .paginate_all(first, |link| async move {
                client.get_device_profiles(&link).await
            })
            .await?)
    }

    /// Every profile summary, optionally restricted to one transport.
    pub async fn device_profile_infos(
        &self,
        search: Option<&str>,
        transport: Option<DeviceTransportType>,
    ) -> Result<Vec<DeviceProfileInfo>, CoreError> {
        let client = self.client();
        let first = page_link(search, None);
        Ok(client
            .paginate_all(first, |link| async move {
                client.get_device_profile_infos(&link, transport).await
            })
            .await?)
    }

    pub async fn device_profile(&self, id: &Uuid) -> Result<DeviceProfile, CoreError> {
        self.client()
            .get_device_profile(id)
            .await
            .map_err(|e| not_found(e, "device profile", id))
    }

    pub async fn device_profile_info(&self, id: &Uuid) -> Result<DeviceProfileInfo, CoreError> {
        self.client()
            .get_device_profile_info(id)
            .await
            .map_err(|e| not_found(e, "device profile", id))
    }

    pub async fn default_device_profile_info(&self) -> Result<DeviceProfileInfo, CoreError> {
        Ok(self.client().get_default_device_profile_info().await?)
    }

    pub async fn save_device_profile(
        &self,
        profile: &DeviceProfile,
    ) -> Result<DeviceProfile, CoreError> {
        let saved = self.client().save_device_profile(profile).await?;
        info!(name = %saved.name, "device profile saved");
        Ok(saved)
    }

    pub async fn delete_device_profile(&self, id: &Uuid) -> Result<(), CoreError> {
        self.client()
            .delete_device_profile(id)
            .await
            .map_err(|e| not_found(e, "device profile", id))
    }

    pub async fn set_default_device_profile(&self, id: &Uuid) -> Result<DeviceProfile, CoreError> {
        self.client()
            .set_default_device_profile(id)
            .await
            .map_err(|e| not_found(e, "device profile", id))
    }

    pub async fn device_profile_keys(
        &self,
        kind: DeviceKeyKind,
        profile_id: Option<&Uuid>,
    ) -> Result<Vec<String>, CoreError> {
        Ok(self
            .client()
            .get_device_profile_devices_keys(kind, profile_id)
            .await?)
    }

    // ── LwM2M ────────────────────────────────────────────────────────

    pub async fn lwm2m_objects(
        &self,
        sort: &SortOrder,
        object_ids: &[String],
        search: Option<&str>,
    ) -> Result<Vec<ObjectLwM2M>, CoreError> {
        Ok(self
            .client()
            .get_lwm2m_objects(sort, object_ids, search)
            .await?)
    }

    pub async fn lwm2m_objects_page(
        &self,
        page_link: &PageLink,
    ) -> Result<Vec<ObjectLwM2M>, CoreError> {
        Ok(self.client().get_lwm2m_objects_page(page_link).await?)
    }

    pub async fn bootstrap_defaults(
        &self,
        mode: SecurityMode,
        bootstrap_server_is: bool,
    ) -> Result<ServerSecurityConfig, CoreError> {
        Ok(self
            .client()
            .get_lwm2m_bootstrap_security_info(mode, bootstrap_server_is)
            .await?)
    }

    // ── Device credentials ───────────────────────────────────────────

    /// Load a device's credentials into an editable model.
    pub async fn device_credentials(&self, device_id: &Uuid) -> Result<CredentialsModel, CoreError> {
        let raw = self
            .client()
            .get_device_credentials(device_id)
            .await
            .map_err(|e| not_found(e, "device", device_id))?;
        Ok(CredentialsModel::from_credentials(raw)?)
    }

    /// Persist credentials. Nothing is sent unless the model validates.
    pub async fn save_device_credentials(
        &self,
        model: &CredentialsModel,
    ) -> Result<CredentialsModel, CoreError> {
        let errors = model.validate();
        if !errors.is_empty() {
            return Err(CoreError::Invalid { errors });
        }
        let saved = self
            .client()
            .save_device_credentials(&model.serialize())
            .await?;
        info!(kind = %saved.credentials_type, "device credentials saved");
        Ok(CredentialsModel::from_credentials(saved)?)
    }

    // ── Firmware ─────────────────────────────────────────────────────

    pub async fn firmwares(&self, search: Option<&str>) -> Result<Vec<FirmwareInfo>, CoreError> {
        let client = self.client();
        Ok(client
            .paginate_all(page_link(search, None), |link| async move {
                client.get_firmwares(&link).await
            })
            .await?)
    }

    /// Firmware of one type assigned to a profile.
    pub async fn firmwares_for_profile(
        &self,
        profile_id: &Uuid,
        firmware_type: FirmwareType,
        has_data: bool,
    ) -> Result<Vec<FirmwareInfo>, CoreError> {
        let client = self.client();
        Ok(client
            .paginate_all(page_link(None, None), |link| async move {
                client
                    .get_firmwares_for_profile(profile_id, firmware_type, has_data, &link)
                    .await
            })
            .await?)
    }

    pub async fn firmware_info(&self, id: &Uuid) -> Result<FirmwareInfo, CoreError> {
        self.client()
            .get_firmware_info(id)
            .await
            .map_err(|e| not_found(e, "firmware", id))
    }

    pub async fn firmware(&self, id: &Uuid) -> Result<Firmware, CoreError> {
        self.client()
            .get_firmware(id)
            .await
            .map_err(|e| not_found(e, "firmware", id))
    }

    pub async fn save_firmware_info(&self, info: &FirmwareInfo) -> Result<FirmwareInfo, CoreError> {
        Ok(self.client().save_firmware_info(info).await?)
    }

    pub async fn upload_firmware(
        &self,
        id: &Uuid,
        file_name: &str,
        content_type: &str,
        data: Vec<u8>,
        checksum: Option<(ChecksumAlgorithm, String)>,
    ) -> Result<Firmware, CoreError> {
        let size = data.len();
        let firmware = self
            .client()
            .upload_firmware_data(id, file_name, content_type, data, checksum)
            .await
            .map_err(|e| not_found(e, "firmware", id))?;
        info!(%id, size, "firmware data uploaded");
        Ok(firmware)
    }

    pub async fn delete_firmware(&self, id: &Uuid) -> Result<(), CoreError> {
        self.client()
            .delete_firmware(id)
            .await
            .map_err(|e| not_found(e, "firmware", id))
    }

    pub async fn download_firmware(&self, id: &Uuid) -> Result<FirmwareDownload, CoreError> {
        self.client()
            .download_firmware(id)
            .await
            .map_err(|e| not_found(e, "firmware", id))
    }
}

impl BootstrapDefaults for Controller {
    type Error = CoreError;

    async fn fetch_bootstrap_defaults(
        &self,
        mode: SecurityMode,
        bootstrap_server_is: bool,
    ) -> Result<ServerSecurityConfig, Self::Error> {
        self.bootstrap_defaults(mode, bootstrap_server_is).await
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn page_link(search: Option<&str>, sort: Option<SortOrder>) -> PageLink {
    let mut link = PageLink::new(LIST_PAGE_SIZE, 0);
    if let Some(text) = search {
        link = link.with_text_search(text);
    }
    if let Some(sort) = sort {
        link = link.with_sort(sort);
    }
    link
}

/// Attach entity context to a not-found error.
fn not_found(err: devprof_api::Error, entity_type: &str, id: &Uuid) -> CoreError {
    match CoreError::from(err) {
        CoreError::NotFound { .. } => CoreError::NotFound {
            entity_type: entity_type.into(),
            identifier: id.to_string(),
        },
        other => other,
    }
}

fn build_transport(config: &ControllerConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
