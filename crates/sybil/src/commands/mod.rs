//! Command dispatch: bridges CLI args -> console calls -> output formatting.

pub mod auth;
pub mod chat;
pub mod config_cmd;
pub mod gdrive;
pub mod pipeline;
pub mod prompt;
pub mod transcripts;
pub mod util;
pub mod whitelist;

use crate::cli::{Command, GlobalOpts};
use crate::config::Context;
use crate::error::CliError;

/// Dispatch a backend-bound command to its handler.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(ctx, args, global).await,
        Command::Logout => auth::logout(ctx, global),
        Command::Whoami => auth::whoami(ctx, global),
        Command::Chat(args) => chat::handle(ctx, args, global).await,
        Command::Whitelist(args) => whitelist::handle(ctx, args, global).await,
        Command::Prompt(args) => prompt::handle(ctx, args, global).await,
        Command::Gdrive(args) => gdrive::handle(ctx, args, global).await,
        Command::Transcripts(args) => transcripts::handle(ctx, args, global).await,
        Command::Pipeline(args) => pipeline::handle(ctx, args, global).await,
        // Handled before a console is built
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
