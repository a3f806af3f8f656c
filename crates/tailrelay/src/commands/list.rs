//! `list` handler and the row type shared with `watch`.

use tabled::Tabled;

use tailrelay_core::{Dashboard, DashboardConfig, ResourceKind, ViewItem, ViewModel};

use crate::cli::{GlobalOpts, ListArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "Autostart")]
    autostart: String,
}

fn yes_no(flag: bool) -> String {
    String::from(if flag { "yes" } else { "no" })
}

fn to_row(item: &ViewItem, view: &ViewModel, color: bool) -> ItemRow {
    ItemRow {
        kind: item.kind().to_string(),
        id: item.id().to_string(),
        address: item.title(view.identity()),
        target: item.target_label(),
        state: output::state_label(item.running(), color),
        enabled: yes_no(item.enabled()),
        autostart: yes_no(item.autostart()),
    }
}

/// Render the visible items of `view`. An empty table becomes the view's
/// empty-state message.
pub fn render_view(
    view: &ViewModel,
    format: &OutputFormat,
    color: bool,
) -> Result<String, CliError> {
    let items = view.items();
    if items.is_empty() && matches!(format, OutputFormat::Table) {
        return Ok(view.empty_message().unwrap_or_default().to_owned());
    }
    output::render_list(
        format,
        &items,
        |item| to_row(item, view, color),
        |item| item.id().to_string(),
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    config: DashboardConfig,
    args: &ListArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let view = Dashboard::oneshot(config, |dashboard| async move {
        if args.relays {
            dashboard.set_visibility(ResourceKind::Proxy, false);
        }
        if args.proxies {
            dashboard.set_visibility(ResourceKind::Relay, false);
        }
        Ok(dashboard.snapshot())
    })
    .await?;

    let color = output::should_color(&global.color);
    let out = render_view(&view, &global.output, color)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
