//! Login, logout and whoami.

use secrecy::SecretString;
use serde::Serialize;

use crate::cli::{GlobalOpts, LoginArgs};
use crate::commands::util::{self, prompt_err};
use crate::config::Context;
use crate::error::CliError;
use crate::output::{self, Palette};

#[derive(Serialize)]
struct Identity<'a> {
    profile: &'a str,
    api_url: &'a str,
    username: Option<&'a str>,
    email: Option<&'a str>,
}

pub async fn login(ctx: &Context, args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let username = match args.username.or_else(|| ctx.profile.username.clone()) {
        Some(name) => name,
        None => dialoguer::Input::<String>::new()
            .with_prompt("Username or email")
            .interact_text()
            .map_err(prompt_err)?,
    };
    let password = resolve_password(ctx, args.password)?;

    let user = util::with_spinner(
        global,
        "Logging in…",
        ctx.console.login(&username, &password),
    )
    .await
    .map_err(|e| CliError::for_login(e, &ctx.profile_name))?;

    let palette = Palette::new(global);
    output::notice(
        global,
        &palette.success(&format!("✓ Logged in as {}", user.display_name())),
    );
    Ok(())
}

/// Flag → profile sources (env, keyring, plaintext) → interactive prompt.
fn resolve_password(ctx: &Context, flag: Option<String>) -> Result<SecretString, CliError> {
    if let Some(pw) = flag {
        return Ok(SecretString::from(pw));
    }
    match sybil_config::resolve_password(&ctx.profile, &ctx.profile_name) {
        Ok(pw) => Ok(pw),
        Err(sybil_config::ConfigError::NoCredentials { .. })
            if std::io::IsTerminal::is_terminal(&std::io::stdin()) =>
        {
            let pw = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            Ok(SecretString::from(pw))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn logout(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let message = if ctx.console.logout() {
        "✓ Logged out"
    } else {
        "Not logged in; nothing to do"
    };
    output::notice(global, message);
    Ok(())
}

pub fn whoami(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let user = ctx.console.user().ok_or(CliError::NotLoggedIn)?;
    let identity = Identity {
        profile: &ctx.profile_name,
        api_url: ctx.console.config().url.as_str(),
        username: user.username.as_deref(),
        email: user.email.as_deref(),
    };
    let out = output::render_single(
        global.output,
        &identity,
        |i| {
            format!(
                "User:     {}\nEmail:    {}\nProfile:  {}\nBackend:  {}",
                output::opt(i.username),
                output::opt(i.email),
                i.profile,
                i.api_url,
            )
        },
        |_| user.display_name().to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
