//! Whitelist command handlers.

use tabled::Tabled;

use sybil_api::{WhitelistCreateRequest, WhitelistEntry, WhitelistStats, WhitelistUpdateRequest};
use sybil_core::{ActionDispatcher, CoreError};

use crate::cli::{GlobalOpts, WhitelistArgs, WhitelistCommand};
use crate::commands::util;
use crate::config::Context;
use crate::error::CliError;
use crate::output::{self, Palette};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Active")]
    active: &'static str,
    #[tabled(rename = "Added By")]
    added_by: String,
    #[tabled(rename = "Notes")]
    notes: String,
}

impl From<&WhitelistEntry> for EntryRow {
    fn from(e: &WhitelistEntry) -> Self {
        Self {
            id: e.id,
            phone: e.phone_number.clone(),
            name: output::opt(e.name.as_deref()),
            active: output::yes_no(e.is_active),
            added_by: output::opt(e.added_by.as_deref()),
            notes: output::truncate(&output::opt(e.notes.as_deref()), 40),
        }
    }
}

fn detail(e: &WhitelistEntry) -> String {
    [
        format!("ID:        {}", e.id),
        format!("Phone:     {}", e.phone_number),
        format!("Name:      {}", output::opt(e.name.as_deref())),
        format!("Active:    {}", output::yes_no(e.is_active)),
        format!("Notes:     {}", output::opt(e.notes.as_deref())),
        format!("Added By:  {}", output::opt(e.added_by.as_deref())),
        format!("Created:   {}", e.created_at),
        format!("Updated:   {}", e.updated_at),
    ]
    .join("\n")
}

fn stats_detail(s: &WhitelistStats) -> String {
    format!(
        "Total:     {}\nActive:    {}\nInactive:  {}",
        s.total, s.active, s.inactive
    )
}

fn print_entry(entry: &WhitelistEntry, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(global.output, entry, detail, |e| e.id.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Trimmed phone number; blank input is rejected before any request.
fn required_phone(raw: &str) -> Result<String, CliError> {
    let phone = raw.trim();
    if phone.is_empty() {
        return Err(CliError::Validation {
            field: "phone_number".into(),
            reason: "phone number cannot be blank".into(),
        });
    }
    Ok(phone.to_owned())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    ctx: &Context,
    args: WhitelistArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client = ctx.console.client();

    match args.command {
        WhitelistCommand::List { active_only } => {
            let view = ctx.console.whitelist(!active_only);
            let page = util::first_snapshot(&view).await?;
            let out = output::render_list(
                global.output,
                &page.entries,
                |e| EntryRow::from(e),
                |e| e.phone_number.clone(),
            )?;
            output::print_output(&out, global.quiet);
            if global.output == crate::cli::OutputFormat::Table {
                let palette = Palette::new(global);
                output::notice(
                    global,
                    &palette.dim(&format!(
                        "{} total, {} active, {} inactive",
                        page.stats.total, page.stats.active, page.stats.inactive
                    )),
                );
            }
            Ok(())
        }

        WhitelistCommand::Add {
            phone_number,
            name,
            notes,
        } => {
            let req = WhitelistCreateRequest {
                phone_number: required_phone(&phone_number)?,
                name,
                notes,
                added_by: ctx.console.user().map(|u| u.display_name().to_owned()),
            };
            let entry = client.add_to_whitelist(&req).await.map_err(CoreError::from)?;
            output::notice(global, &format!("✓ Whitelisted {}", entry.phone_number));
            print_entry(&entry, global)
        }

        WhitelistCommand::Update {
            id,
            phone_number,
            name,
            notes,
            active,
        } => {
            let req = WhitelistUpdateRequest {
                phone_number,
                name,
                notes,
                is_active: active,
            };
            if req.is_empty() {
                return Err(CliError::Validation {
                    field: "update".into(),
                    reason: "nothing to change; pass at least one field flag".into(),
                });
            }
            let entry = client.update_whitelist(id, &req).await.map_err(CoreError::from)?;
            print_entry(&entry, global)
        }

        WhitelistCommand::Toggle { id } => {
            let entry = client.toggle_whitelist_status(id).await.map_err(CoreError::from)?;
            let state = if entry.is_active { "activated" } else { "deactivated" };
            output::notice(global, &format!("✓ {} {state}", entry.phone_number));
            print_entry(&entry, global)
        }

        WhitelistCommand::Delete { id, hard } => {
            let (prompt, action) = if hard {
                (format!("Permanently delete whitelist entry {id}?"), "whitelist delete --hard")
            } else {
                (format!("Deactivate whitelist entry {id}?"), "whitelist delete")
            };
            if !util::confirm(&prompt, global, action)? {
                return Ok(());
            }

            let dispatcher = ActionDispatcher::new(ctx.console.config().settle_delay);
            util::run_action(&dispatcher, "delete", global, || async move {
                client.delete_from_whitelist(id, hard).await?;
                Ok::<_, CoreError>(if hard {
                    format!("Deleted entry {id}")
                } else {
                    format!("Deactivated entry {id}")
                })
            })
            .await?;
            Ok(())
        }

        WhitelistCommand::Check { phone_number } => {
            let whitelisted = client
                .check_phone_number(&phone_number)
                .await
                .map_err(CoreError::from)?;
            let out = output::render_single(
                global.output,
                &serde_json::json!({
                    "phone_number": phone_number,
                    "is_whitelisted": whitelisted,
                }),
                |_| {
                    if whitelisted {
                        format!("{phone_number} is whitelisted")
                    } else {
                        format!("{phone_number} is not whitelisted")
                    }
                },
                |_| whitelisted.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        WhitelistCommand::Stats => {
            let stats = client.whitelist_stats().await.map_err(CoreError::from)?;
            let out = output::render_single(global.output, &stats, stats_detail, |s| {
                s.total.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn blank_phone_is_rejected() {
        for raw in ["", "   ", "\t\n"] {
            let err = required_phone(raw).unwrap_err();
            assert!(
                matches!(&err, CliError::Validation { field, .. } if field == "phone_number"),
                "{raw:?} gave {err:?}"
            );
        }
        assert_eq!(required_phone("  +15551234567 ").unwrap(), "+15551234567");
    }
}
