//! CLI configuration: a thin layer over `sybil_config`.
//!
//! Resolves the active profile, applies `GlobalOpts` overrides (--api-url,
//! --insecure, --timeout) and opens the on-disk session.

use std::path::PathBuf;
use std::time::Duration;

use sybil_config::{ChatCache, Config, FileSessionBackend, Profile};
use sybil_core::{Console, ConsoleConfig, SessionStore, TlsMode};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Everything a backend-bound command needs.
#[derive(Debug)]
pub struct Context {
    pub console: Console,
    pub profile_name: String,
    pub profile: Profile,
    pub chat_cache: ChatCache,
}

pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(sybil_config::config_path)
}

pub fn data_dir(global: &GlobalOpts) -> PathBuf {
    global.data_dir.clone().unwrap_or_else(sybil_config::data_dir)
}

/// Load the config file; a missing file yields defaults.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    match global.config {
        Some(ref path) => Ok(sybil_config::load_config_from(path)?),
        None => Ok(sybil_config::load_config_or_default()),
    }
}

pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref())
}

/// Translate a profile plus global flags into a `ConsoleConfig`.
///
/// Flags take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    config: &Config,
    global: &GlobalOpts,
) -> Result<ConsoleConfig, CliError> {
    let mut console = sybil_config::profile_to_console_config(profile, &config.defaults)?;

    if let Some(ref url) = global.api_url {
        console.url = url.parse().map_err(|_| CliError::Validation {
            field: "api-url".into(),
            reason: format!("invalid URL: {url}"),
        })?;
    }
    if global.insecure {
        console.tls = TlsMode::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        console.timeout = Duration::from_secs(secs);
    }
    Ok(console)
}

/// Build the console around the persisted session.
pub fn build_context(global: &GlobalOpts) -> Result<Context, CliError> {
    let config = load(global)?;
    let profile_name = active_profile_name(global, &config);
    let profile = config.profile_or_default(&profile_name);
    let console_config = resolve_profile(&profile, &config, global)?;

    let dir = data_dir(global);
    let session = SessionStore::new(FileSessionBackend::new(dir.join("session.json")));
    tracing::debug!(
        profile = %profile_name,
        url = %console_config.url,
        authenticated = session.is_authenticated(),
        "resolved console"
    );

    Ok(Context {
        console: Console::new(console_config, session)?,
        profile_name,
        profile,
        chat_cache: ChatCache::new(dir),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["sybil"];
        argv.extend_from_slice(args);
        argv.push("whoami");
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn flags_override_the_profile() {
        let profile = Profile {
            api_url: "https://sybil.example.org".into(),
            timeout: Some(5),
            ..Profile::default()
        };
        let config = Config::default();

        let plain = resolve_profile(&profile, &config, &global(&[])).unwrap();
        assert_eq!(plain.url.as_str(), "https://sybil.example.org/");
        assert_eq!(plain.timeout, Duration::from_secs(5));
        assert!(matches!(plain.tls, TlsMode::System));

        let overridden = resolve_profile(
            &profile,
            &config,
            &global(&["--api-url", "http://127.0.0.1:9000", "-k", "--timeout", "60"]),
        )
        .unwrap();
        assert_eq!(overridden.url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(overridden.timeout, Duration::from_secs(60));
        assert!(matches!(overridden.tls, TlsMode::DangerAcceptInvalid));
    }

    #[test]
    fn bad_url_flag_is_a_usage_error() {
        let err = resolve_profile(
            &Profile::default(),
            &Config::default(),
            &global(&["--api-url", "::nope"]),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), crate::error::exit_code::USAGE);
    }
}
