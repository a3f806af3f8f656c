//! `watch`: the live dashboard.
//!
//! Redraws the list whenever the view changes (periodic refresh, optimistic
//! patch or rollback), streams log lines as they arrive and prints
//! notifications on stderr. Runs until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use tailrelay_core::{Dashboard, DashboardConfig, LogEvent, ViewModel};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::{list, logs};

fn draw(
    view: &ViewModel,
    updated: Option<DateTime<Utc>>,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    if matches!(global.output, OutputFormat::Table) {
        let stamp = updated.map_or_else(
            || "never".to_owned(),
            |at| at.with_timezone(&Local).format("%H:%M:%S").to_string(),
        );
        output::print_output(
            &format!("── {} · updated {stamp} ──", view.count_label()),
            global.quiet,
        );
    }
    output::print_output(&list::render_view(view, &global.output, color)?, global.quiet);
    Ok(())
}

pub async fn handle(
    mut config: DashboardConfig,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(secs) = args.interval {
        config.refresh_interval = Duration::from_secs(secs);
    }
    config.log_stream_enabled = !args.no_logs;
    let color = output::should_color(&global.color);

    let dashboard = Dashboard::new(config)?;
    let mut view = dashboard.view();
    let mut notifications = dashboard.notifications();
    let mut log_events = dashboard.logs().subscribe();

    // A failed first refresh is already queued as a notification; the
    // timer keeps retrying.
    if let Err(e) = dashboard.start().await {
        debug!(error = %e, "initial refresh failed");
    }

    let mut drawn: Arc<ViewModel> = dashboard.snapshot();
    draw(&drawn, dashboard.last_updated(), global, color)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            _ = &mut ctrl_c => break Ok(()),
            changed = view.changed() => {
                let Some(next) = changed else { break Ok(()) };
                if next == drawn {
                    continue;
                }
                drawn = next;
                if let Err(e) = draw(&drawn, dashboard.last_updated(), global, color) {
                    break Err(e);
                }
            }
            notification = notifications.recv() => match notification {
                Ok(notification) => output::print_notification(&notification, color),
                Err(RecvError::Lagged(missed)) => warn!(missed, "notifications dropped"),
                Err(RecvError::Closed) => break Ok(()),
            },
            event = log_events.recv() => {
                let lines = match event {
                    Ok(LogEvent::Reset(lines)) => lines.to_vec(),
                    Ok(LogEvent::Appended(line)) => vec![line],
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "log lines dropped");
                        continue;
                    }
                    Err(RecvError::Closed) => break Ok(()),
                };
                for line in &lines {
                    match logs::format_line(line, &global.output, color) {
                        Ok(text) => output::print_output(&text, global.quiet),
                        Err(e) => {
                            warn!(error = %e, "could not render log line");
                        }
                    }
                }
            }
        }
    };

    dashboard.shutdown().await;
    result
}
