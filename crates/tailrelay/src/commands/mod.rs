//! Command dispatch: bridges CLI args -> dashboard runtime -> output formatting.

pub mod config_cmd;
pub mod list;
pub mod logs;
pub mod proxy;
pub mod relay;
pub mod util;
pub mod watch;

use tailrelay_core::DashboardConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: DashboardConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::List(args) => list::handle(config, &args, global).await,
        Command::Relay(args) => relay::handle(config, args, global).await,
        Command::Proxy(args) => proxy::handle(config, args, global).await,
        Command::Logs(args) => logs::handle(config, args, global).await,
        Command::Watch(args) => watch::handle(config, &args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
