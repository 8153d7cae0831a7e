//! Shared helpers for command handlers.

use std::io::{IsTerminal, Read};
use std::path::Path;

use serde::de::DeserializeOwned;
use uuid::Uuid;

use devprof_core::{
    ChecksumAlgorithm, DeviceCredentialsType, DeviceKeyKind, DeviceTransportType, FirmwareType,
    SecurityMode,
};

use crate::cli::{
    ChecksumArg, CredentialsTypeArg, FirmwareTypeArg, KeyKindArg, SecurityModeArg, TransportArg,
};
use crate::error::CliError;

/// Parse a UUID argument.
pub fn parse_uuid(raw: &str, field: &str) -> Result<Uuid, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("'{raw}' is not a UUID"),
    })
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so `--yes` becomes mandatory.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Read and parse a JSON file for `--from-file` flags; `-` reads stdin.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

// ── CLI value enums → wire types ─────────────────────────────────────

impl From<TransportArg> for DeviceTransportType {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Default => Self::Default,
            TransportArg::Mqtt => Self::Mqtt,
            TransportArg::Coap => Self::Coap,
            TransportArg::Lwm2m => Self::Lwm2m,
        }
    }
}

impl From<SecurityModeArg> for SecurityMode {
    fn from(arg: SecurityModeArg) -> Self {
        match arg {
            SecurityModeArg::NoSec => Self::NoSec,
            SecurityModeArg::Psk => Self::Psk,
            SecurityModeArg::Rpk => Self::Rpk,
            SecurityModeArg::X509 => Self::X509,
        }
    }
}

impl From<CredentialsTypeArg> for DeviceCredentialsType {
    fn from(arg: CredentialsTypeArg) -> Self {
        match arg {
            CredentialsTypeArg::AccessToken => Self::AccessToken,
            CredentialsTypeArg::X509Certificate => Self::X509Certificate,
            CredentialsTypeArg::MqttBasic => Self::MqttBasic,
            CredentialsTypeArg::Lwm2mCredentials => Self::Lwm2mCredentials,
        }
    }
}

impl From<FirmwareTypeArg> for FirmwareType {
    fn from(arg: FirmwareTypeArg) -> Self {
        match arg {
            FirmwareTypeArg::Firmware => Self::Firmware,
            FirmwareTypeArg::Software => Self::Software,
        }
    }
}

impl From<ChecksumArg> for ChecksumAlgorithm {
    fn from(arg: ChecksumArg) -> Self {
        match arg {
            ChecksumArg::Md5 => Self::Md5,
            ChecksumArg::Sha256 => Self::Sha256,
            ChecksumArg::Crc32 => Self::Crc32,
        }
    }
}

impl From<KeyKindArg> for DeviceKeyKind {
    fn from(arg: KeyKindArg) -> Self {
        match arg {
            KeyKindArg::Attributes => Self::Attributes,
            KeyKindArg::Timeseries => Self::Timeseries,
        }
    }
}
