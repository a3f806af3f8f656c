//! Shared helpers for command handlers.

use std::io::IsTerminal;

use tailrelay_core::{
    CoreError, Dashboard, DashboardConfig, Mutation, RecordId, ResourceKind, ViewModel,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Reconcile once, build a mutation from the fresh view, dispatch it and
/// report the outcome on stderr.
pub async fn run_mutation<F>(
    config: DashboardConfig,
    global: &GlobalOpts,
    build: F,
) -> Result<(), CliError>
where
    F: FnOnce(&ViewModel) -> Result<Mutation, CoreError>,
{
    let report = Dashboard::oneshot(config, |dashboard| async move {
        let view = dashboard.snapshot();
        let mutation = build(view.as_ref())?;
        dashboard.dispatch(mutation.clone()).await?;
        Ok(describe(&mutation, &dashboard.snapshot()))
    })
    .await?;

    if !global.quiet {
        eprintln!("{report}");
    }
    Ok(())
}

/// What happened, phrased for the user. Toggles report the state the
/// follow-up refresh observed.
fn describe(mutation: &Mutation, view: &ViewModel) -> String {
    if let Some(message) = mutation.success_message() {
        return message;
    }
    match mutation {
        Mutation::ToggleRun { kind, id } => match view.find(*kind, id) {
            Some(item) if *kind == ResourceKind::Relay => {
                format!("Relay {id} is {}", if item.running() { "running" } else { "stopped" })
            }
            Some(item) => {
                format!("Proxy {id} is {}", if item.enabled() { "enabled" } else { "disabled" })
            }
            None => format!("{} {id} toggled", kind.label()),
        },
        Mutation::SetAutostart { kind, id, autostart } => format!(
            "Autostart {} for {kind} {id}",
            if *autostart { "on" } else { "off" }
        ),
        _ => format!("{} {} done", mutation.kind().label(), mutation.action()),
    }
}

/// The error for an ID absent from the current view.
pub fn not_found(kind: ResourceKind, id: &RecordId) -> CoreError {
    CoreError::NotFound {
        kind,
        id: id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autostart_report_names_the_record() {
        let mutation = Mutation::SetAutostart {
            kind: ResourceKind::Proxy,
            id: "p1".into(),
            autostart: true,
        };
        assert_eq!(
            describe(&mutation, &ViewModel::default()),
            "Autostart on for proxy p1"
        );
    }

    #[test]
    fn toggle_of_vanished_record_still_reports() {
        let mutation = Mutation::ToggleRun {
            kind: ResourceKind::Relay,
            id: "r9".into(),
        };
        assert_eq!(
            describe(&mutation, &ViewModel::default()),
            "Relay r9 toggled"
        );
    }
}
