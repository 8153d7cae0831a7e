//! Device profile command handlers.

use tabled::Tabled;

use devprof_core::{Controller, DeviceProfile, DeviceProfileInfo};

use crate::cli::{GlobalOpts, ProfilesArgs, ProfilesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Transport")]
    transport: String,
    #[tabled(rename = "Provisioning")]
    provisioning: String,
    #[tabled(rename = "Default")]
    default: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&DeviceProfile> for ProfileRow {
    fn from(p: &DeviceProfile) -> Self {
        Self {
            id: profile_id(p),
            name: p.name.clone(),
            transport: p.transport_type.to_string(),
            provisioning: p.provision_type.to_string(),
            default: if p.default { "yes".into() } else { String::new() },
            created: output::format_millis(p.created_time),
        }
    }
}

#[derive(Tabled)]
struct ProfileInfoRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Transport")]
    transport: String,
}

impl From<&DeviceProfileInfo> for ProfileInfoRow {
    fn from(p: &DeviceProfileInfo) -> Self {
        Self {
            id: p.id.id.to_string(),
            name: p.name.clone(),
            transport: p.transport_type.to_string(),
        }
    }
}

fn profile_id(p: &DeviceProfile) -> String {
    p.id.as_ref().map(|id| id.id.to_string()).unwrap_or_default()
}

fn profile_detail(p: &DeviceProfile) -> String {
    let mut pairs = vec![
        ("ID", profile_id(p)),
        ("Name", p.name.clone()),
        ("Type", p.profile_type.to_string()),
        ("Transport", p.transport_type.to_string()),
        ("Provisioning", p.provision_type.to_string()),
        ("Default", p.default.to_string()),
        ("Created", output::format_millis(p.created_time)),
    ];
    if let Some(ref desc) = p.description {
        pairs.push(("Description", desc.clone()));
    }
    if let Some(ref queue) = p.default_queue_name {
        pairs.push(("Queue", queue.clone()));
    }
    if let Some(ref fw) = p.firmware_id {
        pairs.push(("Firmware", fw.id.to_string()));
    }
    if let Some(ref sw) = p.software_id {
        pairs.push(("Software", sw.id.to_string()));
    }
    output::detail_lines(&pairs)
}

fn info_detail(p: &DeviceProfileInfo) -> String {
    output::detail_lines(&[
        ("ID", p.id.id.to_string()),
        ("Name", p.name.clone()),
        ("Type", p.profile_type.to_string()),
        ("Transport", p.transport_type.to_string()),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: ProfilesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ProfilesCommand::List { list, transport } => {
            let search = list.search.as_deref();
            let out = if let Some(transport) = transport {
                let infos = controller
                    .device_profile_infos(search, Some(transport.into()))
                    .await?;
                output::render_list(&global.output, &infos, |p| ProfileInfoRow::from(p), |p| {
                    p.id.id.to_string()
                })
            } else {
                let profiles = controller.device_profiles(search, None).await?;
                output::render_list(&global.output, &profiles, |p| ProfileRow::from(p), profile_id)
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProfilesCommand::Get { id } => {
            let id = util::parse_uuid(&id, "id")?;
            let profile = controller.device_profile(&id).await?;
            let out = output::render_single(&global.output, &profile, profile_detail, profile_id);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProfilesCommand::Default => {
            let info = controller.default_device_profile_info().await?;
            let out = output::render_single(&global.output, &info, info_detail, |p| {
                p.id.id.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProfilesCommand::Apply { from_file } => {
            let profile: DeviceProfile = util::read_json_file(&from_file)?;
            let saved = controller.save_device_profile(&profile).await?;
            let out = output::render_single(&global.output, &saved, profile_detail, profile_id);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProfilesCommand::SetDefault { id } => {
            let id = util::parse_uuid(&id, "id")?;
            let profile = controller.set_default_device_profile(&id).await?;
            if !global.quiet {
                eprintln!("'{}' is now the default profile", profile.name);
            }
            Ok(())
        }

        ProfilesCommand::Delete { id } => {
            let uuid = util::parse_uuid(&id, "id")?;
            let info = controller.device_profile_info(&uuid).await?;
            if !util::confirm(
                &format!("Delete device profile '{}'? This cannot be undone.", info.name),
                "profiles delete",
                global.yes,
            )? {
                return Ok(());
            }
            controller.delete_device_profile(&uuid).await?;
            if !global.quiet {
                eprintln!("Device profile deleted");
            }
            Ok(())
        }

        ProfilesCommand::Keys { kind, profile_id } => {
            let profile_id = profile_id
                .as_deref()
                .map(|raw| util::parse_uuid(raw, "profile-id"))
                .transpose()?;
            let keys = controller
                .device_profile_keys(kind.into(), profile_id.as_ref())
                .await?;
            let out = output::render_single(
                &global.output,
                &keys,
                |keys| keys.join("\n"),
                |keys| keys.join("\n"),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
