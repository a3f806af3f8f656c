//! Clap derive structures for the `tailrelay` CLI.
//!
//! Defines the command tree, global flags, and shared value types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use tailrelay_core::LogLevel;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tailrelay -- terminal dashboard for tailnet relays and proxies
#[derive(Debug, Parser)]
#[command(
    name = "tailrelay",
    version,
    about = "Manage tailrelay TCP relays and HTTPS proxies from the command line",
    long_about = "Talks to the tailrelay web UI API.\n\n\
        Lists and edits socat relays and Caddy proxies, tails the backend\n\
        log, and runs a live dashboard with `tailrelay watch`.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Dashboard profile to use
    #[arg(long, short = 'p', env = "TAILRELAY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Web UI base URL (overrides profile)
    #[arg(long, short = 'u', env = "TAILRELAY_URL", global = true)]
    pub url: Option<String>,

    /// Raw Cookie header for an authenticated web UI session
    #[arg(long, global = true)]
    pub session_cookie: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "TAILRELAY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "TAILRELAY_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "TAILRELAY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// On/off switch for boolean settings.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List relays and proxies
    #[command(alias = "ls")]
    List(ListArgs),

    /// Manage socat TCP relays
    #[command(alias = "r")]
    Relay(RelayArgs),

    /// Manage Caddy HTTPS proxies
    #[command(alias = "px")]
    Proxy(ProxyArgs),

    /// Show or follow the backend log
    Logs(LogsArgs),

    /// Live dashboard: refreshing list, streaming log, notifications
    Watch(WatchArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── List ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Show only relays
    #[arg(long, conflicts_with = "proxies")]
    pub relays: bool,

    /// Show only proxies
    #[arg(long)]
    pub proxies: bool,
}

// ── Relay ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RelayArgs {
    #[command(subcommand)]
    pub command: RelayCommand,
}

#[derive(Debug, Subcommand)]
pub enum RelayCommand {
    /// Create a relay
    Create {
        /// Port to listen on
        #[arg(long)]
        listen_port: u16,

        /// Host to forward to
        #[arg(long)]
        target_host: String,

        /// Port to forward to
        #[arg(long)]
        target_port: u16,

        /// Start the relay when the backend starts
        #[arg(long)]
        autostart: bool,
    },

    /// Update a relay (unset flags keep their current value)
    Update {
        /// Relay ID
        id: String,

        #[arg(long)]
        listen_port: Option<u16>,

        #[arg(long)]
        target_host: Option<String>,

        #[arg(long)]
        target_port: Option<u16>,

        #[arg(long)]
        autostart: Option<Switch>,
    },

    /// Start a stopped relay or stop a running one
    Toggle {
        /// Relay ID
        id: String,
    },

    /// Turn autostart on or off
    Autostart {
        /// Relay ID
        id: String,

        state: Switch,
    },

    /// Delete a relay
    #[command(alias = "rm")]
    Delete {
        /// Relay ID
        id: String,
    },
}

// ── Proxy ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProxyArgs {
    #[command(subcommand)]
    pub command: ProxyCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProxyCommand {
    /// Create a proxy on the tailnet hostname
    Create {
        /// Upstream URL (e.g. http://localhost:3000)
        #[arg(long)]
        target: String,

        /// HTTPS port (80, 443 and 8021 are reserved)
        #[arg(long)]
        port: u16,

        /// Trust X-Forwarded-* headers from the upstream
        #[arg(long)]
        trusted_proxies: bool,

        /// Enable the proxy when the backend starts
        #[arg(long)]
        autostart: bool,

        /// TLS certificate to upload (.pem, .crt or .cer, at most 1 MB)
        #[arg(long, value_name = "PATH")]
        cert: Option<PathBuf>,
    },

    /// Update a proxy (unset flags keep their current value)
    Update {
        /// Proxy ID
        id: String,

        #[arg(long)]
        target: Option<String>,

        #[arg(long)]
        port: Option<u16>,

        #[arg(long)]
        trusted_proxies: Option<Switch>,

        #[arg(long)]
        autostart: Option<Switch>,

        /// TLS certificate to upload
        #[arg(long, value_name = "PATH", conflicts_with = "remove_cert")]
        cert: Option<PathBuf>,

        /// Remove the uploaded certificate
        #[arg(long)]
        remove_cert: bool,
    },

    /// Enable a disabled proxy or disable an enabled one
    Toggle {
        /// Proxy ID
        id: String,
    },

    /// Turn autostart on or off
    Autostart {
        /// Proxy ID
        id: String,

        state: Switch,
    },

    /// Delete a proxy
    #[command(alias = "rm")]
    Delete {
        /// Proxy ID
        id: String,
    },
}

// ── Logs ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LogsArgs {
    /// Keep streaming new lines until interrupted
    #[arg(long, short = 'f')]
    pub follow: bool,

    #[command(subcommand)]
    pub command: Option<LogsCommand>,
}

#[derive(Debug, Subcommand)]
pub enum LogsCommand {
    /// Show or change the backend's minimum log level
    Level {
        /// New level (DEBUG, INFO, WARN, ERROR); omit to show the current one
        level: Option<LogLevel>,
    },
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Refresh period in seconds (overrides profile)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Do not stream the backend log
    #[arg(long)]
    pub no_logs: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or extend the config file with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// Print the config file location
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
