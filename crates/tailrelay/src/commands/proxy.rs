//! Proxy command handlers.

use std::path::Path;

use tailrelay_core::{
    CertificateFile, CoreError, DashboardConfig, Mutation, ProxyDraft, RecordId, ResourceKind,
};

use crate::cli::{GlobalOpts, ProxyArgs, ProxyCommand};
use crate::error::CliError;

use super::util;

fn read_cert(path: Option<&Path>) -> Result<Option<CertificateFile>, CoreError> {
    path.map(CertificateFile::read).transpose()
}

pub async fn handle(
    config: DashboardConfig,
    args: ProxyArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ProxyCommand::Create {
            target,
            port,
            trusted_proxies,
            autostart,
            cert,
        } => {
            let draft = ProxyDraft {
                target,
                port: Some(port),
                trusted_proxies,
                autostart,
                certificate: read_cert(cert.as_deref())?,
                remove_tls_cert: false,
            };
            util::run_mutation(config, global, |_| Ok(Mutation::CreateProxy(draft))).await
        }

        ProxyCommand::Update {
            id,
            target,
            port,
            trusted_proxies,
            autostart,
            cert,
            remove_cert,
        } => {
            let certificate = read_cert(cert.as_deref())?;
            let id = RecordId::new(id);
            util::run_mutation(config, global, |view| {
                let record = view
                    .proxy(&id)
                    .ok_or_else(|| util::not_found(ResourceKind::Proxy, &id))?;
                let mut draft = ProxyDraft::from(record.as_ref());
                if let Some(target) = target {
                    draft.target = target;
                }
                if port.is_some() {
                    draft.port = port;
                }
                if let Some(state) = trusted_proxies {
                    draft.trusted_proxies = state.is_on();
                }
                if let Some(state) = autostart {
                    draft.autostart = state.is_on();
                }
                draft.certificate = certificate;
                draft.remove_tls_cert = remove_cert;
                Ok(Mutation::UpdateProxy { id, draft })
            })
            .await
        }

        ProxyCommand::Toggle { id } => {
            util::run_mutation(config, global, |_| {
                Ok(Mutation::ToggleRun {
                    kind: ResourceKind::Proxy,
                    id: id.into(),
                })
            })
            .await
        }

        ProxyCommand::Autostart { id, state } => {
            util::run_mutation(config, global, |_| {
                Ok(Mutation::SetAutostart {
                    kind: ResourceKind::Proxy,
                    id: id.into(),
                    autostart: state.is_on(),
                })
            })
            .await
        }

        ProxyCommand::Delete { id } => {
            if !util::confirm(&format!("Delete proxy {id}?"), global.yes)? {
                return Ok(());
            }
            util::run_mutation(config, global, |_| {
                Ok(Mutation::Delete {
                    kind: ResourceKind::Proxy,
                    id: id.into(),
                })
            })
            .await
        }
    }
}
