//! LwM2M command handlers.

use tabled::Tabled;

use devprof_core::{
    Controller, Direction, ObjectLwM2M, PageLink, SecurityConfigModel, SecurityMode,
    ServerSecurityConfig, SortOrder,
};

use crate::cli::{GlobalOpts, Lwm2mArgs, Lwm2mCommand};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ObjectRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Key")]
    key_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Multiple")]
    multiple: bool,
    #[tabled(rename = "Mandatory")]
    mandatory: bool,
    #[tabled(rename = "Instances")]
    instances: usize,
}

impl From<&ObjectLwM2M> for ObjectRow {
    fn from(o: &ObjectLwM2M) -> Self {
        Self {
            id: o.id,
            key_id: o.key_id.clone(),
            name: o.name.clone(),
            multiple: o.multiple,
            mandatory: o.mandatory,
            instances: o.instances.len(),
        }
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

fn server_detail(c: &ServerSecurityConfig) -> String {
    output::detail_lines(&[
        (
            "Role",
            if c.bootstrap_server_is {
                "bootstrap server".into()
            } else {
                "LwM2M server".into()
            },
        ),
        ("Mode", c.security_mode.to_string()),
        ("Host", c.host.clone()),
        ("Port", opt(c.port)),
        ("Server ID", opt(c.server_id)),
        ("Hold-off time", opt(c.client_hold_off_time)),
        ("Account timeout", opt(c.bootstrap_server_account_timeout)),
        (
            "Public key",
            if c.server_public_key.is_empty() {
                "-".into()
            } else {
                format!("{} hex chars", c.server_public_key.len())
            },
        ),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: Lwm2mArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        Lwm2mCommand::Objects {
            list,
            ids,
            sort,
            desc,
            page,
            page_size,
        } => {
            let direction = if desc { Direction::Desc } else { Direction::Asc };
            let sort = SortOrder::new(sort, direction);
            let objects = if let Some(page) = page {
                let mut link = PageLink::new(page_size, page).with_sort(sort);
                if let Some(search) = list.search {
                    link = link.with_text_search(search);
                }
                controller.lwm2m_objects_page(&link).await?
            } else {
                controller
                    .lwm2m_objects(&sort, &ids, list.search.as_deref())
                    .await?
            };
            let out = output::render_list(
                &global.output,
                &objects,
                |o| ObjectRow::from(o),
                |o| o.key_id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        Lwm2mCommand::Defaults { mode, bootstrap } => {
            let defaults = controller
                .bootstrap_defaults(mode.into(), bootstrap)
                .await?;
            let out = output::render_single(&global.output, &defaults, server_detail, |c| {
                c.host.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        Lwm2mCommand::Server {
            mode,
            bootstrap,
            host,
            public_key,
            optional,
        } => {
            let mut model =
                SecurityConfigModel::initialize(bootstrap, !optional, &controller.config().url);
            model
                .change_security_mode(controller, SecurityMode::from(mode))
                .await?;
            if host.is_some() || public_key.is_some() {
                model.edit(|c| {
                    if let Some(host) = host {
                        c.host = host;
                    }
                    if let Some(key) = public_key {
                        c.server_public_key = key;
                    }
                });
            }

            let errors = model.validate();
            let color = output::should_color(&global.color);
            let out = output::render_single(
                &global.output,
                model.value(),
                |c| {
                    format!(
                        "{}\n\n{}",
                        server_detail(c),
                        output::validation_summary(&errors, color)
                    )
                },
                |c| c.host.clone(),
            );
            output::print_output(&out, global.quiet);

            if errors.is_empty() {
                Ok(())
            } else {
                Err(CliError::Invalid { errors })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_hides_key_material() {
        let config = ServerSecurityConfig {
            host: "lwm2m.example.com".into(),
            port: Some(5686),
            server_public_key: "ab".repeat(91),
            ..ServerSecurityConfig::default()
        };
        let detail = server_detail(&config);
        assert!(detail.contains("182 hex chars"));
        assert!(!detail.contains("abab"));
        assert!(detail.contains("LwM2M server"));
    }
}
