//! Firmware command handlers.

use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use tabled::Tabled;

use devprof_core::{ChecksumAlgorithm, Controller, EntityId, FirmwareInfo};

use crate::cli::{FirmwareArgs, FirmwareCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct FirmwareRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Type")]
    firmware_type: String,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Size")]
    size: String,
}

impl From<&FirmwareInfo> for FirmwareRow {
    fn from(f: &FirmwareInfo) -> Self {
        Self {
            id: firmware_id(f),
            title: f.title.clone().unwrap_or_default(),
            version: f.version.clone().unwrap_or_default(),
            firmware_type: f.firmware_type.to_string(),
            file: f.file_name.clone().unwrap_or_else(|| "-".into()),
            size: f.data_size.map(|s| ByteSize(s).to_string()).unwrap_or_default(),
        }
    }
}

fn firmware_id(f: &FirmwareInfo) -> String {
    f.id.as_ref().map(|id| id.id.to_string()).unwrap_or_default()
}

fn firmware_detail(f: &FirmwareInfo) -> String {
    let mut pairs = vec![
        ("ID", firmware_id(f)),
        ("Title", f.title.clone().unwrap_or_default()),
        ("Version", f.version.clone().unwrap_or_default()),
        ("Type", f.firmware_type.to_string()),
        ("Has data", f.has_data.to_string()),
        ("Created", output::format_millis(f.created_time)),
    ];
    if let Some(ref profile) = f.device_profile_id {
        pairs.push(("Profile", profile.id.to_string()));
    }
    if let Some(ref name) = f.file_name {
        pairs.push(("File", name.clone()));
    }
    if let Some(ref ct) = f.content_type {
        pairs.push(("Content type", ct.clone()));
    }
    if let Some(size) = f.data_size {
        pairs.push(("Size", ByteSize(size).to_string()));
    }
    if let (Some(alg), Some(sum)) = (f.checksum_algorithm, &f.checksum) {
        pairs.push(("Checksum", format!("{} {sum}", alg.label())));
    }
    output::detail_lines(&pairs)
}

/// Where a download lands: explicit path, else the server's file name.
fn download_target(explicit: Option<PathBuf>, server_name: Option<&str>, id: &str) -> PathBuf {
    explicit.unwrap_or_else(|| {
        server_name
            .and_then(|name| Path::new(name).file_name())
            .map_or_else(|| PathBuf::from(format!("{id}.bin")), PathBuf::from)
    })
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    controller: &Controller,
    args: FirmwareArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        FirmwareCommand::List {
            list,
            profile_id,
            firmware_type,
            has_data,
        } => {
            let items = match (profile_id, firmware_type) {
                (Some(raw), Some(kind)) => {
                    let profile_id = util::parse_uuid(&raw, "profile-id")?;
                    controller
                        .firmwares_for_profile(&profile_id, kind.into(), has_data)
                        .await?
                }
                _ => controller.firmwares(list.search.as_deref()).await?,
            };
            let out = output::render_list(
                &global.output,
                &items,
                |f| FirmwareRow::from(f),
                firmware_id,
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FirmwareCommand::Get { id, with_data } => {
            let id = util::parse_uuid(&id, "id")?;
            let out = if with_data {
                let firmware = controller.firmware(&id).await?;
                output::render_single(
                    &global.output,
                    &firmware,
                    |f| firmware_detail(&f.info),
                    |f| f.data.clone().unwrap_or_default(),
                )
            } else {
                let info = controller.firmware_info(&id).await?;
                output::render_single(&global.output, &info, firmware_detail, firmware_id)
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FirmwareCommand::Create {
            title,
            version,
            firmware_type,
            profile_id,
        } => {
            let device_profile_id = profile_id
                .as_deref()
                .map(|raw| util::parse_uuid(raw, "profile-id"))
                .transpose()?
                .map(|id| EntityId::new("DEVICE_PROFILE", id));
            let info = FirmwareInfo {
                id: None,
                created_time: None,
                tenant_id: None,
                firmware_type: firmware_type.into(),
                device_profile_id,
                title: Some(title),
                version: Some(version),
                has_data: false,
                file_name: None,
                checksum: None,
                checksum_algorithm: None,
                content_type: None,
                data_size: None,
                additional_info: None,
            };
            let saved = controller.save_firmware_info(&info).await?;
            let out = output::render_single(&global.output, &saved, firmware_detail, firmware_id);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FirmwareCommand::Upload {
            id,
            file,
            content_type,
            checksum,
            algorithm,
        } => {
            let uuid = util::parse_uuid(&id, "id")?;
            let data = std::fs::read(&file)?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| CliError::Validation {
                    field: "file".into(),
                    reason: format!("{} has no file name", file.display()),
                })?;
            let checksum = algorithm
                .zip(checksum)
                .map(|(alg, sum)| (ChecksumAlgorithm::from(alg), sum));

            let firmware = controller
                .upload_firmware(&uuid, &file_name, &content_type, data, checksum)
                .await?;
            let out = output::render_single(
                &global.output,
                &firmware.info,
                firmware_detail,
                firmware_id,
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FirmwareCommand::Download { id, output_file } => {
            let uuid = util::parse_uuid(&id, "id")?;
            let download = controller.download_firmware(&uuid).await?;
            let target = download_target(output_file, download.file_name.as_deref(), &id);
            std::fs::write(&target, &download.data)?;
            if !global.quiet {
                eprintln!(
                    "Saved {} to {}",
                    ByteSize(u64::try_from(download.data.len()).unwrap_or(u64::MAX)),
                    target.display()
                );
            }
            Ok(())
        }

        FirmwareCommand::Delete { id } => {
            let uuid = util::parse_uuid(&id, "id")?;
            if !util::confirm(
                &format!("Delete firmware {id}? This cannot be undone."),
                "firmware delete",
                global.yes,
            )? {
                return Ok(());
            }
            controller.delete_firmware(&uuid).await?;
            if !global.quiet {
                eprintln!("Firmware deleted");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_prefers_explicit_path_then_server_name() {
        assert_eq!(
            download_target(Some("out.bin".into()), Some("fw.bin"), "x"),
            PathBuf::from("out.bin")
        );
        assert_eq!(
            download_target(None, Some("../../etc/fw.bin"), "x"),
            PathBuf::from("fw.bin")
        );
        assert_eq!(download_target(None, None, "abc"), PathBuf::from("abc.bin"));
    }
}
