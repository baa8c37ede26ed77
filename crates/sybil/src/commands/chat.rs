//! Chat command handlers.
//!
//! The transcript lives in the per-user chat cache and is sent along as
//! history with every new question.

use serde::Serialize;
use tabled::Tabled;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use sybil_api::{ChatMessage, ChatRole};
use sybil_core::chat::GREETING;
use sybil_core::{ChatSession, CoreError};

use crate::cli::{ChatArgs, ChatCommand, GlobalOpts};
use crate::commands::util;
use crate::config::Context;
use crate::error::CliError;
use crate::output::{self, Palette};

#[derive(Tabled)]
struct MessageRow {
    #[tabled(rename = "Time")]
    timestamp: String,
    #[tabled(rename = "From")]
    role: &'static str,
    #[tabled(rename = "Message")]
    content: String,
}

impl From<&ChatMessage> for MessageRow {
    fn from(m: &ChatMessage) -> Self {
        Self {
            timestamp: m.timestamp.clone(),
            role: role_label(m.role),
            content: output::truncate(&m.content, 80),
        }
    }
}

fn role_label(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "you",
        ChatRole::Assistant => "sybil",
    }
}

#[derive(Serialize)]
struct Health {
    status: serde_json::Value,
}

pub async fn handle(ctx: &Context, args: ChatArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ChatCommand::Send { message } => {
            let mut chat = open(ctx)?;
            let result = util::with_spinner(global, "Thinking…", chat.send(&message))
                .await
                .map(|reply| reply.content.clone());
            // The question stays cached even when the call failed.
            ctx.chat_cache.save(chat.history())?;
            output::print_output(&result?, global.quiet);
            Ok(())
        }

        ChatCommand::Repl => repl(ctx, global).await,

        ChatCommand::History { limit } => {
            let user = ctx.console.user().ok_or(CliError::NotLoggedIn)?;
            let history = ctx
                .chat_cache
                .load(user.display_name(), ctx.console.config().chat_history);
            let messages = history.to_vec();
            let skip = limit.map_or(0, |n| messages.len().saturating_sub(n));
            let shown = messages.get(skip..).unwrap_or_default();

            let out = output::render_list(
                global.output,
                shown,
                |m| MessageRow::from(m),
                |m| m.content.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ChatCommand::Clear => {
            let user = ctx.console.user().ok_or(CliError::NotLoggedIn)?;
            ctx.chat_cache.clear(user.display_name())?;
            output::notice(global, "✓ Chat history cleared");
            Ok(())
        }

        ChatCommand::Health => {
            let status = ctx.console.client().chat_health().await.map_err(CoreError::from)?;
            let health = Health { status };
            let out = output::render_single(global.output, &health, health_detail, |h| {
                h.status
                    .get("status")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("ok")
                    .to_owned()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

fn health_detail(health: &Health) -> String {
    match health.status {
        serde_json::Value::Object(ref map) => map
            .iter()
            .map(|(key, value)| match value.as_str() {
                Some(text) => format!("{key}: {text}"),
                None => format!("{key}: {value}"),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        ref other => other.to_string(),
    }
}

/// Chat session for the logged-in user, continuing the cached transcript.
fn open(ctx: &Context) -> Result<ChatSession, CliError> {
    let user = ctx.console.user().ok_or(CliError::NotLoggedIn)?;
    let history = ctx
        .chat_cache
        .load(user.display_name(), ctx.console.config().chat_history);
    Ok(ctx.console.chat(Some(history))?)
}

async fn repl(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let palette = Palette::new(global);
    let mut chat = open(ctx)?;

    eprintln!("{}", palette.heading(GREETING));
    eprintln!("{}", palette.dim("Empty line or Ctrl-D to finish."));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stderr = tokio::io::stderr();
    loop {
        stderr.write_all(b"\nyou> ").await?;
        stderr.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            break;
        }

        let result = util::with_spinner(global, "Thinking…", chat.send(&line))
            .await
            .map(|reply| reply.content.clone());
        ctx.chat_cache.save(chat.history())?;

        match result {
            Ok(reply) => println!("\n{reply}"),
            Err(e) if e.requires_login() => return Err(e.into()),
            Err(e) => eprintln!("{}", palette.failure(&format!("✗ {e}"))),
        }
    }
    Ok(())
}
