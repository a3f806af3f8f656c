//! CLI configuration: thin wrapper around `tailrelay_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--url, --session-cookie, --insecure, --timeout).

use std::time::Duration;

use secrecy::SecretString;

use tailrelay_core::{DashboardConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use tailrelay_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Build the `DashboardConfig` for this invocation.
///
/// The active profile (if any) supplies the base; flags override it. With
/// no profile, `--url` alone is enough. An explicitly requested profile
/// that does not exist is an error.
pub fn resolve_dashboard_config(global: &GlobalOpts) -> Result<DashboardConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
            names.sort();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
        None => {
            let url = global.url.as_deref().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            Profile::new(url)
        }
    };

    apply_overrides(&profile, &cfg.defaults, global)
}

/// Layer flag values over a profile.
fn apply_overrides(
    profile: &Profile,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<DashboardConfig, CliError> {
    let mut profile = profile.clone();
    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }

    let mut config = tailrelay_config::profile_to_dashboard_config(&profile, defaults)?;

    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(ref cookie) = global.session_cookie {
        config.session_cookie = Some(SecretString::from(cookie.clone()));
    }

    Ok(config)
}
