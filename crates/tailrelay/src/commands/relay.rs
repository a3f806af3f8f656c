//! Relay command handlers.

use tailrelay_core::{DashboardConfig, Mutation, RecordId, RelayDraft, ResourceKind};

use crate::cli::{GlobalOpts, RelayArgs, RelayCommand};
use crate::error::CliError;

use super::util;

pub async fn handle(
    config: DashboardConfig,
    args: RelayArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        RelayCommand::Create {
            listen_port,
            target_host,
            target_port,
            autostart,
        } => {
            let draft = RelayDraft {
                listen_port,
                target_host,
                target_port,
                autostart,
            };
            util::run_mutation(config, global, |_| Ok(Mutation::CreateRelay(draft))).await
        }

        RelayCommand::Update {
            id,
            listen_port,
            target_host,
            target_port,
            autostart,
        } => {
            let id = RecordId::new(id);
            util::run_mutation(config, global, |view| {
                let record = view
                    .relay(&id)
                    .ok_or_else(|| util::not_found(ResourceKind::Relay, &id))?;
                let mut draft = RelayDraft::from(record.as_ref());
                if let Some(port) = listen_port {
                    draft.listen_port = port;
                }
                if let Some(host) = target_host {
                    draft.target_host = host;
                }
                if let Some(port) = target_port {
                    draft.target_port = port;
                }
                if let Some(state) = autostart {
                    draft.autostart = state.is_on();
                }
                Ok(Mutation::UpdateRelay { id, draft })
            })
            .await
        }

        RelayCommand::Toggle { id } => {
            util::run_mutation(config, global, |_| {
                Ok(Mutation::ToggleRun {
                    kind: ResourceKind::Relay,
                    id: id.into(),
                })
            })
            .await
        }

        RelayCommand::Autostart { id, state } => {
            util::run_mutation(config, global, |_| {
                Ok(Mutation::SetAutostart {
                    kind: ResourceKind::Relay,
                    id: id.into(),
                    autostart: state.is_on(),
                })
            })
            .await
        }

        RelayCommand::Delete { id } => {
            if !util::confirm(&format!("Delete relay {id}?"), global.yes)? {
                return Ok(());
            }
            util::run_mutation(config, global, |_| {
                Ok(Mutation::Delete {
                    kind: ResourceKind::Relay,
                    id: id.into(),
                })
            })
            .await
        }
    }
}
