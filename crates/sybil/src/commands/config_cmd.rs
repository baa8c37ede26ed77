//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};
use secrecy::SecretString;

use sybil_api::DEFAULT_BASE_URL;
use sybil_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::commands::util::prompt_err;
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of `cfg` with plaintext passwords masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("****".into());
        }
    }
    cfg
}

fn prompt_password(prompt: &str) -> Result<SecretString, CliError> {
    let pass = rpassword::prompt_password(prompt).map_err(prompt_err)?;
    if pass.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(pass))
}

/// Keyring or plaintext. Returns the secret when it belongs in the file.
fn store_password(profile_name: &str, password: &SecretString) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        sybil_config::store_password(profile_name, password)?;
        eprintln!("   ✓ Password stored in system keyring");
        Ok(None)
    } else {
        use secrecy::ExposeSecret;
        Ok(Some(password.expose_secret().to_owned()))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load(global)?);
            let out = output::render_single(
                global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("# unrenderable: {e}")),
                |c| c.profiles.keys().cloned().collect::<Vec<_>>().join("\n"),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword => {
            let cfg = config::load(global)?;
            let profile_name = config::active_profile_name(global, &cfg);
            let password = prompt_password(&format!("Password for '{profile_name}': "))?;
            sybil_config::store_password(&profile_name, &password)?;
            output::notice(
                global,
                &format!("✓ Password for '{profile_name}' stored in system keyring"),
            );
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path(global).display().to_string(), false);
            Ok(())
        }
    }
}

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_path(global);
    eprintln!("Sybil console: configuration wizard");
    eprintln!("   Config path: {}\n", path.display());

    let mut cfg = config::load(global)?;

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default(global.profile.clone().unwrap_or_else(|| "default".into()))
        .interact_text()
        .map_err(prompt_err)?;

    let api_url: String = Input::new()
        .with_prompt("Backend URL")
        .default(DEFAULT_BASE_URL.into())
        .interact_text()
        .map_err(prompt_err)?;
    if url::Url::parse(&api_url).is_err() {
        return Err(CliError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL: {api_url}"),
        });
    }

    let username: String = Input::new()
        .with_prompt("Username or email (blank to ask at login)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let remember = Confirm::new()
        .with_prompt("Remember a password for this profile?")
        .default(false)
        .interact()
        .map_err(prompt_err)?;
    let password = if remember {
        store_password(&profile_name, &prompt_password("Password: ")?)?
    } else {
        None
    };

    let profile = Profile {
        api_url,
        username: Some(username).filter(|u| !u.trim().is_empty()),
        password,
        ..cfg.profiles.get(&profile_name).cloned().unwrap_or_default()
    };
    cfg.profiles.insert(profile_name.clone(), profile);

    let make_default = cfg.profiles.len() == 1
        || Confirm::new()
            .with_prompt(format!("Make '{profile_name}' the default profile?"))
            .default(true)
            .interact()
            .map_err(prompt_err)?;
    if make_default {
        cfg.default_profile = Some(profile_name.clone());
    }

    sybil_config::save_config_to(&path, &cfg)?;
    eprintln!("\n   ✓ Profile '{profile_name}' saved to {}", path.display());
    eprintln!("   Next: sybil login");
    Ok(())
}
