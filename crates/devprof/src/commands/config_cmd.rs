//! Config subcommand handlers.

use std::fmt::Write;

use dialoguer::{Confirm, Input, Select};
use secrecy::{ExposeSecret, SecretString};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile, SecretKind};
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of the config with every stored secret masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some(MASK.into());
        }
        if profile.token.is_some() {
            profile.token = Some(MASK.into());
        }
    }
    cfg
}

/// TOML-ish listing of an already redacted config.
fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out, "\n[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out, "\n[profiles.{name}]");
        let _ = writeln!(out, "url = \"{}\"", p.url);
        let _ = writeln!(out, "auth_mode = \"{}\"", p.auth_mode);
        let strings = [
            ("username", &p.username),
            ("password", &p.password),
            ("token", &p.token),
            ("token_env", &p.token_env),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                let _ = writeln!(out, "{key} = \"{value}\"");
            }
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out.trim_end().to_owned()
}

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn profile_not_found(cfg: &Config, name: String) -> CliError {
    let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
    available.sort();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

fn prompt_secret(label: &str) -> Result<SecretString, CliError> {
    let secret = rpassword::prompt_password(label).map_err(prompt_err)?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: "secret".into(),
            reason: "value cannot be empty".into(),
        });
    }
    Ok(SecretString::from(secret))
}

/// Keyring (returns `None`) or plaintext (returns the secret).
fn prompt_storage(
    profile_name: &str,
    kind: SecretKind,
    secret: SecretString,
) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the secret?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    if selection == 0 {
        config::store_secret(profile_name, kind, &secret)?;
        eprintln!("   Secret stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret.expose_secret().to_owned()))
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be 'true' or 'false'".into(),
    })
}

fn parse_secs(field: &str, value: &str) -> Result<u64, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be a number (seconds)".into(),
    })
}

/// Apply `key = value` to the defaults table (`defaults.<field>`) or a
/// profile.
fn apply_setting(
    cfg: &mut Config,
    profile_name: &str,
    key: &str,
    value: String,
) -> Result<(), CliError> {
    if let Some(field) = key.strip_prefix("defaults.") {
        let defaults = &mut cfg.defaults;
        match field {
            "output" => defaults.output = value,
            "color" => defaults.color = value,
            "insecure" => defaults.insecure = parse_bool(key, &value)?,
            "timeout" => defaults.timeout = parse_secs(key, &value)?,
            other => {
                return Err(CliError::Validation {
                    field: other.into(),
                    reason: "valid defaults keys: output, color, insecure, timeout".into(),
                });
            }
        }
        return Ok(());
    }

    let profile = cfg.profiles.entry(profile_name.to_owned()).or_default();
    if profile.auth_mode.is_empty() {
        profile.auth_mode = "password".into();
    }
    match key {
        "url" => {
            devprof_config::parse_url(&value)?;
            profile.url = value;
        }
        "auth_mode" | "auth-mode" => {
            if !matches!(value.as_str(), "password" | "token") {
                return Err(devprof_config::invalid_auth_mode(&value).into());
            }
            profile.auth_mode = value;
        }
        "username" => profile.username = Some(value),
        "token_env" | "token-env" => profile.token_env = Some(value),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => profile.insecure = Some(parse_bool(key, &value)?),
        "timeout" => profile.timeout = Some(parse_secs(key, &value)?),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: url, auth_mode, username, \
                     token_env, ca_cert, insecure, timeout, defaults.<field>"
                ),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("devprof configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let url: String = Input::new()
                .with_prompt("Platform URL")
                .default("https://localhost:8080".into())
                .validate_with(|raw: &String| {
                    devprof_config::parse_url(raw)
                        .map(|_| ())
                        .map_err(|e| e.to_string())
                })
                .interact_text()
                .map_err(prompt_err)?;

            let auth_selection = Select::new()
                .with_prompt("Authentication method")
                .items(&["Username/Password (recommended)", "Pre-issued JWT"])
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let mut profile = Profile {
                url,
                ..Profile::default()
            };
            if auth_selection == 0 {
                let username: String = Input::new()
                    .with_prompt("Username")
                    .interact_text()
                    .map_err(prompt_err)?;
                let password = prompt_secret("Password: ")?;
                profile.auth_mode = "password".into();
                profile.username = Some(username);
                profile.password = prompt_storage(&profile_name, SecretKind::Password, password)?;
            } else {
                let token = prompt_secret("JWT: ")?;
                profile.auth_mode = "token".into();
                profile.token = prompt_storage(&profile_name, SecretKind::Token, token)?;
            }

            let insecure = Confirm::new()
                .with_prompt("Accept self-signed certificates?")
                .default(false)
                .interact()
                .map_err(prompt_err)?;
            profile.insecure = insecure.then_some(true);

            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            let path = config::save_config(&cfg)?;

            eprintln!("\nConfiguration written to {}", path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: devprof profiles default");
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config()?);
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                config::config_path().display().to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);
            apply_setting(&mut cfg, &profile_name, &key, value)?;
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: devprof config init");
                return Ok(());
            }
            let mut names: Vec<_> = cfg.profiles.keys().collect();
            names.sort();
            let lines: Vec<_> = names
                .into_iter()
                .map(|name| {
                    if name == default {
                        format!("{name} *")
                    } else {
                        name.clone()
                    }
                })
                .collect();
            output::print_output(&lines.join("\n"), global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(&cfg, name));
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Default profile set to '{name}'");
            }
            Ok(())
        }

        ConfigCommand::SetPassword { profile, token } => {
            let cfg = config::load_config()?;
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            let Some(prof) = cfg.profiles.get(&profile_name) else {
                return Err(profile_not_found(&cfg, profile_name));
            };

            let (kind, label) = if token || prof.auth_mode == "token" {
                (SecretKind::Token, "JWT: ")
            } else {
                (SecretKind::Password, "Password: ")
            };
            let secret = prompt_secret(label)?;
            config::store_secret(&profile_name, kind, &secret)?;
            eprintln!("Secret stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn config_with_secrets() -> Config {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                url: "https://iot.lab.local".into(),
                auth_mode: "password".into(),
                username: Some("tenant@example.com".into()),
                password: Some("s3cret".into()),
                ..Profile::default()
            },
        );
        cfg
    }

    #[test]
    fn show_masks_secrets() {
        let text = format_config(&redacted(&config_with_secrets()));
        assert!(text.contains("[profiles.lab]"));
        assert!(text.contains("password = \"****\""));
        assert!(!text.contains("s3cret"));
    }

    #[test]
    fn set_creates_profile_and_validates_values() {
        let mut cfg = Config::default();
        apply_setting(&mut cfg, "prod", "url", "https://iot.example.com".into()).unwrap();
        apply_setting(&mut cfg, "prod", "timeout", "5".into()).unwrap();
        let prod = cfg.profile("prod").unwrap();
        assert_eq!(prod.url, "https://iot.example.com");
        assert_eq!(prod.auth_mode, "password");
        assert_eq!(prod.timeout, Some(5));

        assert!(apply_setting(&mut cfg, "prod", "url", "not a url".into()).is_err());
        assert!(apply_setting(&mut cfg, "prod", "auth_mode", "apikey".into()).is_err());
        assert!(apply_setting(&mut cfg, "prod", "colour", "x".into()).is_err());
    }

    #[test]
    fn set_defaults_table() {
        let mut cfg = Config::default();
        apply_setting(&mut cfg, "any", "defaults.insecure", "true".into()).unwrap();
        assert!(cfg.defaults.insecure);
        assert!(cfg.profiles.is_empty());
    }
}
