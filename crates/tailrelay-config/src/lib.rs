//! Shared configuration for tailrelay tools.
//!
//! TOML profiles, session-cookie resolution (env + plaintext), and
//! translation to `tailrelay_core::DashboardConfig`. The CLI layers its
//! flag overrides on top of what this crate resolves.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tailrelay_core::{DEFAULT_REFRESH_INTERVAL, DashboardConfig, TlsVerification};

/// Environment variable consulted for a session cookie when the profile
/// names none.
pub const SESSION_COOKIE_ENV: &str = "TAILRELAY_SESSION_COOKIE";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named dashboard profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// The profile to use: `requested`, else `default_profile`, else
    /// `"default"`.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Background refresh period for `watch`, in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Pause between log stream reconnects, in milliseconds.
    #[serde(default)]
    pub reconnect_delay_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            refresh_interval_secs: default_refresh_interval(),
            reconnect_delay_ms: 0,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL.as_secs()
}

/// A named dashboard profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Web UI base URL (e.g., "http://tailrelay:8021").
    pub url: String,

    /// Raw `Cookie` header value (plaintext; prefer `session_cookie_env`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,

    /// Environment variable holding the `Cookie` header value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_cookie_env: Option<String>,

    /// Path to a custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval_secs: Option<u64>,
}

impl Profile {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            session_cookie: None,
            session_cookie_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            refresh_interval_secs: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "tailrelay", "tailrelay").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("tailrelay");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` layered over defaults, then `TAILRELAY_` variables
/// (nested keys split on `__`, e.g. `TAILRELAY_DEFAULTS__TIMEOUT`).
/// A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TAILRELAY_").split("__"));

    Ok(figment.extract()?)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Session resolution ──────────────────────────────────────────────

/// Resolve the session cookie: the profile's env var, then
/// [`SESSION_COOKIE_ENV`], then plaintext in the profile. `None` means
/// the backend is used without authentication.
pub fn resolve_session_cookie(profile: &Profile) -> Option<SecretString> {
    resolve_session_cookie_with(profile, |name| std::env::var(name).ok())
}

fn resolve_session_cookie_with(
    profile: &Profile,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    profile
        .session_cookie_env
        .as_deref()
        .and_then(&lookup)
        .or_else(|| lookup(SESSION_COOKIE_ENV))
        .or_else(|| profile.session_cookie.clone())
        .filter(|cookie| !cookie.trim().is_empty())
        .map(SecretString::from)
}

// ── Translation ─────────────────────────────────────────────────────

pub fn parse_url(raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Build a `DashboardConfig` from a profile and the global defaults.
///
/// Suitable for long-running consumers: the refresh timer and the log
/// stream are enabled. One-shot callers override both.
pub fn profile_to_dashboard_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<DashboardConfig, ConfigError> {
    let mut config = DashboardConfig::new(parse_url(&profile.url)?);

    config.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.refresh_interval = Duration::from_secs(
        profile
            .refresh_interval_secs
            .unwrap_or(defaults.refresh_interval_secs),
    );
    config.reconnect_delay = Duration::from_millis(defaults.reconnect_delay_ms);
    config.session_cookie = resolve_session_cookie(profile);

    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.refresh_interval_secs, 15);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        let mut home = Profile::new("http://tailrelay:8021");
        home.timeout = Some(5);
        home.session_cookie_env = Some("HOME_COOKIE".into());
        cfg.profiles.insert("home".into(), home.clone());
        cfg.default_profile = Some("home".into());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.active_profile_name(None), "home");
        assert_eq!(loaded.profile("home").unwrap(), &home);
        assert!(matches!(
            loaded.profile("work"),
            Err(ConfigError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[defaults]\ntimeout = 10\n\n[profiles.lab]\nurl = \"https://lab:8021\"\ninsecure = true\n",
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.defaults.timeout, 10);
        assert_eq!(cfg.defaults.output, "table");

        let dashboard = profile_to_dashboard_config(cfg.profile("lab").unwrap(), &cfg.defaults)
            .unwrap();
        assert_eq!(dashboard.url.as_str(), "https://lab:8021/");
        assert_eq!(dashboard.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(dashboard.timeout, Duration::from_secs(10));
        assert_eq!(dashboard.refresh_interval, DEFAULT_REFRESH_INTERVAL);
        assert!(dashboard.log_stream_enabled);
    }

    #[test]
    fn ca_cert_applies_unless_insecure() {
        let mut profile = Profile::new("https://box:8021");
        profile.ca_cert = Some(PathBuf::from("/etc/ca.pem"));
        let cfg = profile_to_dashboard_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(cfg.tls, TlsVerification::CustomCa(PathBuf::from("/etc/ca.pem")));

        profile.insecure = Some(true);
        let cfg = profile_to_dashboard_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(cfg.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn bad_url_is_a_validation_error() {
        let err = profile_to_dashboard_config(&Profile::new("not a url"), &Defaults::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "url"));
    }

    #[test]
    fn session_cookie_resolution_order() {
        let mut profile = Profile::new("http://box:8021");
        profile.session_cookie = Some("session=plain".into());
        profile.session_cookie_env = Some("BOX_COOKIE".into());

        let env = |name: &str| match name {
            "BOX_COOKIE" => Some("session=from-profile-env".to_owned()),
            SESSION_COOKIE_ENV => Some("session=global".to_owned()),
            _ => None,
        };
        let cookie = resolve_session_cookie_with(&profile, env).unwrap();
        assert_eq!(cookie.expose_secret(), "session=from-profile-env");

        let global_only = |name: &str| (name == SESSION_COOKIE_ENV).then(|| "session=global".to_owned());
        let cookie = resolve_session_cookie_with(&profile, global_only).unwrap();
        assert_eq!(cookie.expose_secret(), "session=global");

        let cookie = resolve_session_cookie_with(&profile, |_| None).unwrap();
        assert_eq!(cookie.expose_secret(), "session=plain");

        profile.session_cookie = Some("   ".into());
        assert!(resolve_session_cookie_with(&profile, |_| None).is_none());
    }
}
