//! Log command handlers: snapshot, follow, level.

use std::time::Duration;

use owo_colors::OwoColorize;
use tokio::sync::broadcast::error::RecvError;

use tailrelay_core::{Dashboard, DashboardConfig, LogEvent, LogLevel, LogLine};

use crate::cli::{GlobalOpts, LogsArgs, LogsCommand, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Rendering ───────────────────────────────────────────────────────

/// One line in the chosen format. Structured formats emit compact JSON
/// or a YAML document per line so `--follow` output stays streamable.
pub fn format_line(line: &LogLine, format: &OutputFormat, color: bool) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Table | OutputFormat::Plain => paint(line, color),
        OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(line)?,
        OutputFormat::Yaml => format!("---\n{}", serde_yaml::to_string(line)?.trim_end()),
    })
}

fn paint(line: &LogLine, color: bool) -> String {
    let text = line.render();
    if !color {
        return text;
    }
    match line.entry.level.parse::<LogLevel>() {
        Ok(LogLevel::Error) => text.red().to_string(),
        Ok(LogLevel::Warn) => text.yellow().to_string(),
        Ok(LogLevel::Debug) => text.dimmed().to_string(),
        Ok(LogLevel::Info) | Err(_) => text,
    }
}

fn print_lines(lines: &[LogLine], global: &GlobalOpts, color: bool) -> Result<(), CliError> {
    for line in lines {
        output::print_output(&format_line(line, &global.output, color)?, global.quiet);
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    mut config: DashboardConfig,
    args: LogsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // The log commands never need the relay/proxy view.
    config.refresh_interval = Duration::ZERO;
    config.log_stream_enabled = false;
    let dashboard = Dashboard::new(config)?;
    let logs = dashboard.logs();
    let color = output::should_color(&global.color);

    match args.command {
        Some(LogsCommand::Level { level: None }) => {
            logs.load_snapshot().await?;
            output::print_output(&logs.level().to_string(), global.quiet);
            Ok(())
        }

        Some(LogsCommand::Level { level: Some(level) }) => {
            let applied = logs.set_level(level).await?;
            if !global.quiet {
                eprintln!("Log level set to {applied}");
            }
            Ok(())
        }

        None if args.follow => follow(&dashboard, global, color).await,

        None => {
            logs.load_snapshot().await?;
            print_lines(&logs.lines(), global, color)
        }
    }
}

/// Stream until Ctrl-C. The snapshot arrives as the first `Reset`.
async fn follow(dashboard: &Dashboard, global: &GlobalOpts, color: bool) -> Result<(), CliError> {
    let logs = dashboard.logs();
    let mut events = logs.subscribe();
    let mut notifications = dashboard.notifications();

    logs.start().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            _ = &mut ctrl_c => break Ok(()),
            event = events.recv() => match event {
                Ok(LogEvent::Reset(lines)) => {
                    if let Err(e) = print_lines(&lines, global, color) {
                        break Err(e);
                    }
                }
                Ok(LogEvent::Appended(line)) => {
                    if let Err(e) = print_lines(std::slice::from_ref(&line), global, color) {
                        break Err(e);
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "terminal fell behind the log stream");
                }
                Err(RecvError::Closed) => break Ok(()),
            },
            notification = notifications.recv() => {
                if let Ok(notification) = notification {
                    output::print_notification(&notification, color);
                }
            }
        }
    };

    logs.stop().await;
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(level: &str) -> LogLine {
        serde_json::from_value::<tailrelay_core::LogEntry>(serde_json::json!({
            "timestamp": "2024-05-01T12:00:00Z",
            "level": level,
            "message": "relay started"
        }))
        .map(|entry| LogLine {
            received_at: chrono::Utc::now(),
            entry,
        })
        .unwrap()
    }

    #[test]
    fn json_lines_are_single_line() {
        let out = format_line(&line("INFO"), &OutputFormat::Json, false).unwrap();
        assert!(!out.contains('\n'));
        assert!(out.contains("\"message\":\"relay started\""));
    }

    #[test]
    fn plain_lines_skip_color() {
        let out = format_line(&line("ERROR"), &OutputFormat::Plain, false).unwrap();
        assert!(out.ends_with("[ERROR] relay started"));
    }
}
