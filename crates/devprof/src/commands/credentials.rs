//! Device credentials command handlers.
//!
//! `check`, `new` and `default-lwm2m` run the rules engine locally and never
//! touch the platform; the rest go through the `Controller`.

use serde::Serialize;
use serde_json::json;

use devprof_core::lwm2m::{default_security_config, default_security_config_pretty};
use devprof_core::{
    Controller, CredentialsModel, DeviceCredentials, DeviceCredentialsType, EntityId,
    SecurityConfigEditor, SecurityDialogRequest, SecurityDialogResult, ValidationErrors,
};

use crate::cli::{CredentialsArgs, CredentialsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Rendering ───────────────────────────────────────────────────────

/// Wire form plus the rules verdict, for structured output.
#[derive(Serialize)]
struct CheckReport {
    valid: bool,
    errors: ValidationErrors,
    credentials: DeviceCredentials,
}

impl CheckReport {
    fn of(model: &CredentialsModel) -> Self {
        let errors = model.validate();
        Self {
            valid: errors.is_empty(),
            errors,
            credentials: model.serialize(),
        }
    }
}

fn credentials_detail(model: &CredentialsModel) -> String {
    let mut pairs = vec![("Type", model.credentials_type().to_string())];
    if let Some(basic) = model.mqtt_basic() {
        pairs.push(("Client ID", basic.client_id.clone().unwrap_or_default()));
        pairs.push(("User name", basic.user_name.clone().unwrap_or_default()));
        let password = match basic.password.as_deref() {
            Some(p) if !p.is_empty() => "****",
            _ => "",
        };
        pairs.push(("Password", password.into()));
    } else {
        pairs.push(("ID", model.credentials_id().unwrap_or_default().to_owned()));
        if let Some(value) = model.credentials_value() {
            pairs.push(("Value", value.to_owned()));
        }
    }
    output::detail_lines(&pairs)
}

fn report_detail(model: &CredentialsModel, report: &CheckReport, color: bool) -> String {
    format!(
        "{}\n\n{}",
        credentials_detail(model),
        output::validation_summary(&report.errors, color)
    )
}

/// Print a model in the selected format and fail if it breaks any rule.
fn print_checked(model: &CredentialsModel, global: &GlobalOpts) -> Result<(), CliError> {
    let report = CheckReport::of(model);
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| report_detail(model, r, color),
        |r| r.credentials.credentials_type.to_string(),
    );
    output::print_output(&out, global.quiet);
    if report.valid {
        Ok(())
    } else {
        Err(CliError::Invalid {
            errors: report.errors,
        })
    }
}

// ── Editor ──────────────────────────────────────────────────────────

/// Opens the security document in `$EDITOR` as
/// `{"endPoint": ..., "jsonAllConfig": ...}`.
struct TerminalEditor;

impl SecurityConfigEditor for TerminalEditor {
    type Error = CliError;

    fn edit(
        &mut self,
        request: SecurityDialogRequest,
    ) -> Result<Option<SecurityDialogResult>, CliError> {
        let document = json!({
            "endPoint": request.end_point,
            "jsonAllConfig": request.config,
        });
        let text = serde_json::to_string_pretty(&document)?;
        let edited = dialoguer::Editor::new()
            .extension(".json")
            .edit(&text)
            .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
        match edited {
            Some(edited) => Ok(Some(serde_json::from_str(&edited)?)),
            None => Ok(None),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

/// Subcommands that need no platform connection.
pub fn is_offline(args: &CredentialsArgs) -> bool {
    matches!(
        args.command,
        CredentialsCommand::Check { .. }
            | CredentialsCommand::New { .. }
            | CredentialsCommand::DefaultLwm2m
    )
}

pub fn handle_offline(args: CredentialsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        CredentialsCommand::Check { file } => {
            let raw: DeviceCredentials = util::read_json_file(&file)?;
            let model = CredentialsModel::from_credentials(raw)?;
            print_checked(&model, global)
        }

        CredentialsCommand::New { credentials_type } => {
            let model = CredentialsModel::new(credentials_type.into());
            let out = output::render_single(
                &global.output,
                &model.serialize(),
                |c| output::render_json_pretty(c),
                |c| c.credentials_type.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CredentialsCommand::DefaultLwm2m => {
            let config = default_security_config();
            let out = output::render_single(
                &global.output,
                &config,
                |_| default_security_config_pretty(),
                |_| default_security_config_pretty(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CredentialsCommand::Get { .. }
        | CredentialsCommand::Set { .. }
        | CredentialsCommand::Edit { .. } => unreachable!(),
    }
}

pub async fn handle(
    controller: &Controller,
    args: CredentialsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        CredentialsCommand::Get { device_id } => {
            let device_id = util::parse_uuid(&device_id, "device-id")?;
            let model = controller.device_credentials(&device_id).await?;
            let out = output::render_single(
                &global.output,
                &model.serialize(),
                |_| credentials_detail(&model),
                |c| c.credentials_id.clone().unwrap_or_default(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CredentialsCommand::Set {
            device_id,
            from_file,
        } => {
            let uuid = util::parse_uuid(&device_id, "device-id")?;
            let mut raw: DeviceCredentials = util::read_json_file(&from_file)?;
            if raw.id.is_none() {
                raw.id = controller.device_credentials(&uuid).await?.serialize().id;
            }
            raw.device_id = Some(EntityId::new("DEVICE", uuid));

            let model = CredentialsModel::from_credentials(raw)?;
            let saved = controller.save_device_credentials(&model).await?;
            if !global.quiet {
                eprintln!("Credentials updated ({})", saved.credentials_type());
            }
            Ok(())
        }

        CredentialsCommand::Edit { device_id } => {
            let uuid = util::parse_uuid(&device_id, "device-id")?;
            let mut model = controller.device_credentials(&uuid).await?;
            if model.credentials_type() != DeviceCredentialsType::Lwm2mCredentials {
                return Err(CliError::Validation {
                    field: "credentialsType".into(),
                    reason: format!(
                        "device uses {}; only LWM2M_CREDENTIALS carry a security document",
                        model.credentials_type()
                    ),
                });
            }

            if !model.open_security_dialog(&mut TerminalEditor)? {
                if !global.quiet {
                    eprintln!("No changes");
                }
                return Ok(());
            }

            let errors = model.validate();
            if !errors.is_empty() {
                return Err(CliError::Invalid { errors });
            }
            if !util::confirm("Save the edited credentials?", "credentials edit", global.yes)? {
                return Ok(());
            }
            controller.save_device_credentials(&model).await?;
            if !global.quiet {
                eprintln!("Credentials updated");
            }
            Ok(())
        }

        CredentialsCommand::Check { .. }
        | CredentialsCommand::New { .. }
        | CredentialsCommand::DefaultLwm2m => handle_offline(args, global),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mqtt_password_is_masked_in_detail() {
        let raw = DeviceCredentials {
            credentials_type: DeviceCredentialsType::MqttBasic,
            credentials_value: Some(
                r#"{"clientId":"dev1","userName":"u","password":"hunter2"}"#.into(),
            ),
            ..DeviceCredentials::default()
        };
        let model = CredentialsModel::from_credentials(raw).unwrap();
        let detail = credentials_detail(&model);
        assert!(detail.contains("dev1"));
        assert!(detail.contains("****"));
        assert!(!detail.contains("hunter2"));
    }

    #[test]
    fn report_carries_normalised_wire_form() {
        let model = CredentialsModel::new(DeviceCredentialsType::AccessToken);
        let report = CheckReport::of(&model);
        assert!(!report.valid);
        assert!(report.errors.has("credentialsId", "required"));
        assert_eq!(
            report.credentials.credentials_type,
            DeviceCredentialsType::AccessToken
        );
    }
}
