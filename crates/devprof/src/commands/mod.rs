//! Command dispatch: bridges CLI args -> `Controller` calls -> output formatting.

pub mod config_cmd;
pub mod credentials;
pub mod firmware;
pub mod lwm2m;
pub mod profiles;
pub mod util;

use devprof_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a platform-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Profiles(args) => profiles::handle(controller, args, global).await,
        Command::Firmware(args) => firmware::handle(controller, args, global).await,
        Command::Lwm2m(args) => lwm2m::handle(controller, args, global).await,
        Command::Credentials(args) => credentials::handle(controller, args, global).await,
        // Handled before a connection is made
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
