//! Otter transcript handlers: listing, retries and call classification.

use tabled::Tabled;

use sybil_api::{
    CallType, OtterTranscript, OtterTranscriptStats, SortOrder, TranscriptQuery, TranscriptSort,
    TranscriptStatus,
};
use sybil_core::{ActionDispatcher, ClassificationSettings, CoreError, StatusFilter};

use crate::cli::{
    CallTypeArg, GlobalOpts, OrderArg, SortArg, TranscriptConfigCommand, TranscriptStatusArg,
    TranscriptsArgs, TranscriptsCommand,
};
use crate::commands::util;
use crate::config::Context;
use crate::error::CliError;
use crate::output;

// ── Argument mapping ────────────────────────────────────────────────

fn query(sort_by: SortArg, order: OrderArg, call_type: Option<CallTypeArg>) -> TranscriptQuery {
    TranscriptQuery {
        sort_by: match sort_by {
            SortArg::Date => TranscriptSort::Date,
            SortArg::Title => TranscriptSort::Title,
        },
        order: match order {
            OrderArg::Asc => SortOrder::Asc,
            OrderArg::Desc => SortOrder::Desc,
        },
        call_type: call_type.map(|c| match c {
            CallTypeArg::Team => CallType::Team,
            CallTypeArg::Private => CallType::Private,
        }),
        include_failed: true,
    }
}

fn status_filter(arg: TranscriptStatusArg) -> StatusFilter {
    match arg {
        TranscriptStatusArg::All => StatusFilter::All,
        TranscriptStatusArg::Processed => StatusFilter::Processed,
        TranscriptStatusArg::Failed => StatusFilter::Failed,
    }
}

// ── Rendering ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct TranscriptRow {
    #[tabled(rename = "Conversation")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Call Type")]
    call_type: &'static str,
    #[tabled(rename = "Processed")]
    processed_at: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl From<&OtterTranscript> for TranscriptRow {
    fn from(t: &OtterTranscript) -> Self {
        Self {
            id: t.conversation_id.clone(),
            title: output::truncate(&t.title, 48),
            status: match t.status {
                TranscriptStatus::Processed => "processed",
                TranscriptStatus::Failed => "failed",
                TranscriptStatus::Unknown => "unknown",
            },
            call_type: t.call_type.map_or("-", CallType::as_str),
            processed_at: output::opt(t.processed_at.as_deref()),
            error: output::truncate(&output::opt(t.error_message.as_deref()), 40),
        }
    }
}

fn stats_detail(s: &OtterTranscriptStats) -> String {
    let count = |n: Option<u64>| n.map_or_else(|| "-".into(), |n| n.to_string());
    [
        format!("Processed:       {}", s.total_processed),
        format!("Team Calls:      {}", count(s.team_calls_count)),
        format!("Private Calls:   {}", count(s.private_calls_count)),
        format!("Failed:          {}", count(s.failed_count)),
        format!("Last Processed:  {}", output::opt(s.last_processed.as_deref())),
    ]
    .join("\n")
}

fn settings_detail(s: &ClassificationSettings) -> String {
    let mut lines = vec![
        format!("Team Calls Folder:  {}", s.team_calls_folder_name),
        format!("Private Folder:     {}", s.private_folder_name),
        format!("Team Indicators:    {}", s.team_call_indicators.len()),
    ];
    lines.extend(s.team_call_indicators.iter().map(|i| format!("  - {i}")));
    lines.join("\n")
}

#[derive(serde::Serialize)]
struct SettingsView<'a> {
    team_call_indicators: &'a [String],
    team_calls_folder_name: &'a str,
    private_folder_name: &'a str,
}

fn print_settings(settings: &ClassificationSettings, global: &GlobalOpts) -> Result<(), CliError> {
    let view = SettingsView {
        team_call_indicators: &settings.team_call_indicators,
        team_calls_folder_name: &settings.team_calls_folder_name,
        private_folder_name: &settings.private_folder_name,
    };
    let out = output::render_single(
        global.output,
        &view,
        |_| settings_detail(settings),
        |v| v.team_call_indicators.join("\n"),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    ctx: &Context,
    args: TranscriptsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client = ctx.console.client();

    match args.command {
        TranscriptsCommand::List {
            sort_by,
            order,
            call_type,
            status,
        } => {
            let view = ctx.console.otter_transcripts(query(sort_by, order, call_type));
            let page = util::first_snapshot(&view).await?;
            let shown: Vec<OtterTranscript> = status_filter(status)
                .apply(&page.transcripts)
                .into_iter()
                .cloned()
                .collect();
            let out = output::render_list(
                global.output,
                &shown,
                |t| TranscriptRow::from(t),
                |t| t.conversation_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TranscriptsCommand::Stats => {
            let stats = client.otter_transcript_stats().await.map_err(CoreError::from)?;
            let out = output::render_single(global.output, &stats, stats_detail, |s| {
                s.total_processed.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TranscriptsCommand::Retry { conversation_id } => {
            let dispatcher = ActionDispatcher::new(ctx.console.config().settle_delay);
            util::run_action(&dispatcher, "retry", global, || async move {
                let resp = client.retry_otter_transcript(&conversation_id).await?;
                Ok::<_, CoreError>(if resp.message.is_empty() {
                    format!("Queued {conversation_id} for reprocessing")
                } else {
                    resp.message
                })
            })
            .await?;
            Ok(())
        }

        TranscriptsCommand::Config(args) => {
            let current = client.get_otter_config().await.map_err(CoreError::from)?;
            let mut settings = ClassificationSettings::from_config(&current);

            let changed = match args.command {
                TranscriptConfigCommand::Show => {
                    return print_settings(&settings, global);
                }
                TranscriptConfigCommand::AddIndicator { indicator } => {
                    if !settings.add_indicator(&indicator) {
                        output::notice(global, &format!("'{indicator}' is already an indicator"));
                        return Ok(());
                    }
                    true
                }
                TranscriptConfigCommand::RemoveIndicator { indicator } => {
                    if !settings.remove_indicator(&indicator) {
                        return Err(CliError::Validation {
                            field: "indicator".into(),
                            reason: format!("'{indicator}' is not a team-call indicator"),
                        });
                    }
                    true
                }
                TranscriptConfigCommand::SetFolders { team, private } => {
                    let before = settings.clone();
                    settings.set_folders(team.as_deref(), private.as_deref());
                    settings != before
                }
            };

            if changed {
                let dispatcher = ActionDispatcher::new(ctx.console.config().settle_delay);
                let pending = settings.clone();
                util::run_action(&dispatcher, "save", global, || async move {
                    pending.save(client).await
                })
                .await?;
            } else {
                output::notice(global, "Nothing to change");
            }
            print_settings(&settings, global)
        }
    }
}
