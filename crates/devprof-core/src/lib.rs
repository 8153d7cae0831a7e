// devprof-core: Credential and LwM2M rules engines plus the platform facade.

pub mod config;
pub mod controller;
pub mod credentials;
pub mod error;
pub mod lwm2m;
pub mod validation;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AuthCredentials, ControllerConfig, TlsVerification};
pub use controller::Controller;
pub use credentials::{
    CredentialsError, CredentialsModel, MqttBasicCredentials, SecurityConfigEditor,
    SecurityDialogRequest, SecurityDialogResult,
};
pub use error::CoreError;
pub use lwm2m::{BootstrapDefaults, Change, HostResolver, PropagationState, SecurityConfigModel};
pub use validation::{Rule, ValidationErrors};

// Wire types consumers need alongside the models.
pub use devprof_api::types::{
    ChecksumAlgorithm, DeviceCredentials, DeviceCredentialsType, DeviceKeyKind, DeviceProfile,
    DeviceProfileInfo, DeviceTransportType, Direction, EntityId, Firmware, FirmwareDownload,
    FirmwareInfo, FirmwareType, ObjectLwM2M, PageLink, SecurityMode, ServerSecurityConfig,
    SortOrder,
};
