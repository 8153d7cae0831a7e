//! CLI configuration: thin wrapper around `devprof_config`.
//!
//! Adds resolution that respects `GlobalOpts` overrides (--url, --token,
//! --insecure, --timeout).

use std::time::Duration;

use secrecy::SecretString;

use devprof_core::{AuthCredentials, ControllerConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use devprof_config::{
    Config, Profile, SecretKind, config_path, load_config, load_config_or_default, save_config,
    store_secret,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Translate a `Profile` + global flags into a `ControllerConfig`.
///
/// Flags win over profile values. `--token` switches any profile to token
/// auth.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<ControllerConfig, CliError> {
    let url = devprof_config::parse_url(global.url.as_deref().unwrap_or(&profile.url))?;

    let auth = match global.token {
        Some(ref token) => AuthCredentials::Token(SecretString::from(token.clone())),
        None => devprof_config::resolve_auth(profile, profile_name)?,
    };

    Ok(ControllerConfig {
        url,
        auth,
        tls: devprof_config::tls_for(profile, global.insecure),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(global.timeout)),
    })
}

/// Build a `ControllerConfig` from flags alone, when no profile matches.
pub fn from_flags(global: &GlobalOpts, profile_name: String) -> Result<ControllerConfig, CliError> {
    let url_str = global.url.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let url = devprof_config::parse_url(url_str)?;

    let Some(ref token) = global.token else {
        return Err(CliError::NoCredentials {
            profile: profile_name,
        });
    };

    Ok(ControllerConfig {
        url,
        auth: AuthCredentials::Token(SecretString::from(token.clone())),
        tls: if global.insecure {
            TlsVerification::DangerAcceptInvalid
        } else {
            TlsVerification::SystemDefaults
        },
        timeout: Duration::from_secs(global.timeout),
    })
}
