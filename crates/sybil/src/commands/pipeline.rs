//! Pipeline handlers: dashboard reads, scheduler controls and settings.
//!
//! Controls follow the dashboard: the summary is loaded first, a control
//! the dashboard would grey out is refused unless `--force` is given, and
//! the status is reloaded shortly after a successful action.

use std::time::Duration;

use serde::Serialize;
use tabled::Tabled;

use sybil_api::{
    DailyStats, DashboardSummary, PipelineConfigMap, PipelineError, PipelineRun, PipelineState,
    PipelineStatus, RunStatus,
};
use sybil_core::{CoreError, PipelineAction, PipelineSettings, views};

use crate::cli::{GlobalOpts, PipelineArgs, PipelineCommand, PipelineConfigCommand};
use crate::commands::util;
use crate::config::Context;
use crate::error::CliError;
use crate::output::{self, Palette};

// ── Labels ──────────────────────────────────────────────────────────

fn state_label(state: PipelineState) -> &'static str {
    match state {
        PipelineState::Running => "running",
        PipelineState::Stopped => "stopped",
        PipelineState::Error => "error",
        PipelineState::Paused => "paused",
        PipelineState::Unknown => "unknown",
    }
}

fn run_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Completed => "completed",
        RunStatus::Failed => "failed",
        RunStatus::Running => "running",
        RunStatus::Unknown => "unknown",
    }
}

fn interval(secs: u64) -> String {
    humantime::format_duration(Duration::from_secs(secs)).to_string()
}

// ── Rows and detail views ───────────────────────────────────────────

#[derive(Tabled)]
struct RunRow {
    #[tabled(rename = "Run")]
    run_id: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Started")]
    started_at: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Processed")]
    processed: u64,
    #[tabled(rename = "Failed")]
    failed: u64,
    #[tabled(rename = "Skipped")]
    skipped: u64,
    #[tabled(rename = "Entities")]
    entities: u64,
}

impl From<&PipelineRun> for RunRow {
    fn from(r: &PipelineRun) -> Self {
        Self {
            run_id: r.run_id.clone(),
            status: run_label(r.status),
            started_at: r.started_at.clone(),
            duration: r.duration_seconds.map_or_else(|| "-".into(), output::seconds),
            processed: r.transcripts_processed,
            failed: r.transcripts_failed,
            skipped: r.transcripts_skipped,
            entities: r.entities_extracted,
        }
    }
}

#[derive(Tabled)]
struct ErrorRow {
    #[tabled(rename = "Occurred")]
    occurred_at: String,
    #[tabled(rename = "Type")]
    error_type: String,
    #[tabled(rename = "Transcript")]
    transcript: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&PipelineError> for ErrorRow {
    fn from(e: &PipelineError) -> Self {
        Self {
            occurred_at: e.occurred_at.clone(),
            error_type: e.error_type.clone(),
            transcript: output::truncate(
                e.transcript_title.as_deref().unwrap_or(&e.conversation_id),
                36,
            ),
            message: output::truncate(&e.error_message, 60),
        }
    }
}

#[derive(Clone, Serialize, Tabled)]
struct ErrorTypeCount {
    #[tabled(rename = "Type")]
    error_type: String,
    #[tabled(rename = "Count")]
    count: u64,
}

#[derive(Tabled)]
struct DailyRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Processed")]
    processed: u64,
    #[tabled(rename = "Failed")]
    failed: u64,
}

impl From<&DailyStats> for DailyRow {
    fn from(d: &DailyStats) -> Self {
        Self {
            date: d.date.clone(),
            processed: d.transcripts_processed,
            failed: d.transcripts_failed,
        }
    }
}

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Type")]
    value_type: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Updated")]
    updated_at: String,
}

fn status_detail(s: &PipelineStatus) -> String {
    let breaker = if s.circuit_breaker_open { "open" } else { "closed" };
    [
        format!("State:                {}", state_label(s.status)),
        format!("Running:              {}", output::yes_no(s.is_running)),
        format!("Circuit Breaker:      {breaker}"),
        format!("Consecutive Failures: {}", s.consecutive_failures),
        format!("Interval:             {}", interval(s.interval_seconds)),
        format!("Last Run:             {}", output::opt(s.last_run_at.as_deref())),
        format!("Next Run:             {}", output::opt(s.next_scheduled_run.as_deref())),
    ]
    .join("\n")
}

fn summary_detail(d: &DashboardSummary) -> String {
    let p = &d.processing;
    let perf = &d.performance;
    let q = &d.data_quality;
    [
        status_detail(&d.status),
        String::new(),
        format!("Processed:            {}", p.processed_transcripts),
        format!("Failed:               {}", p.failed_transcripts),
        format!("Pending:              {}", p.pending_transcripts),
        format!("Success Rate (7d):    {:.1}%", p.success_rate_7d),
        format!("Chunks:               {}", p.total_chunks),
        format!("Entities:             {}", p.total_entities),
        format!("Relationships:        {}", p.total_relationships),
        String::new(),
        format!("Avg Processing:       {}", output::millis(perf.avg_processing_time_ms)),
        format!("P95 Processing:       {}", output::millis(perf.p95_processing_time_ms)),
        format!("Throughput:           {:.1} transcripts/hour", perf.transcripts_per_hour),
        format!("Entities/Transcript:  {:.1}", q.avg_entities_per_transcript),
        format!("Relations/Transcript: {:.1}", q.avg_relationships_per_transcript),
        String::new(),
        format!("Recent Errors:        {}", d.recent_errors_count),
        format!("Last Updated:         {}", d.last_updated),
    ]
    .join("\n")
}

fn settings_table(config: &PipelineConfigMap) -> String {
    let rows: Vec<SettingRow> = config
        .iter()
        .map(|(key, v)| SettingRow {
            key: key.clone(),
            value: v.value.clone(),
            value_type: v.value_type.clone(),
            description: output::truncate(&v.description, 48),
            updated_at: output::opt(v.updated_at.as_deref()),
        })
        .collect();
    output::render_table(&rows)
}

fn print_settings(config: &PipelineConfigMap, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(global.output, config, settings_table, |c| {
        c.iter()
            .map(|(k, v)| format!("{k}={}", v.value))
            .collect::<Vec<_>>()
            .join("\n")
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// One-line status after an action.
fn status_line(s: &PipelineStatus) -> String {
    let mut line = format!("Pipeline {}", state_label(s.status));
    if let Some(ref next) = s.next_scheduled_run {
        line.push_str(&format!(", next run {next}"));
    }
    if s.circuit_breaker_open {
        line.push_str(", circuit breaker open");
    }
    line
}

/// Parse `key=value` arguments.
fn parse_pairs(pairs: &[String]) -> Result<Vec<(&str, &str)>, CliError> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim(), v.trim()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| CliError::Validation {
                    field: pair.clone(),
                    reason: "expected KEY=VALUE".into(),
                })
        })
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(ctx: &Context, args: PipelineArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let client = ctx.console.client();

    match args.command {
        PipelineCommand::Status => {
            let status = client.pipeline_status().await.map_err(CoreError::from)?;
            let out = output::render_single(global.output, &status, status_detail, |s| {
                state_label(s.status).to_owned()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PipelineCommand::Summary => {
            let summary = client.pipeline_summary().await.map_err(CoreError::from)?;
            let out = output::render_single(global.output, &summary, summary_detail, |s| {
                state_label(s.status.status).to_owned()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PipelineCommand::Runs { limit } => {
            let runs = client.pipeline_runs(limit).await.map_err(CoreError::from)?;
            let out = output::render_list(
                global.output,
                &runs,
                |r| RunRow::from(r),
                |r| r.run_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PipelineCommand::Errors { limit, by_type } => {
            let out = if by_type {
                let counts: Vec<ErrorTypeCount> = client
                    .pipeline_errors_by_type()
                    .await
                    .map_err(CoreError::from)?
                    .into_iter()
                    .map(|(error_type, count)| ErrorTypeCount { error_type, count })
                    .collect();
                output::render_list(global.output, &counts, Clone::clone, |c| {
                    c.error_type.clone()
                })?
            } else {
                let errors = client.pipeline_errors(limit).await.map_err(CoreError::from)?;
                output::render_list(
                    global.output,
                    &errors,
                    |e| ErrorRow::from(e),
                    |e| e.id.to_string(),
                )?
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PipelineCommand::DailyStats { days } => {
            let daily = client.daily_stats(days).await.map_err(CoreError::from)?;
            let out = output::render_list(
                global.output,
                &daily,
                |d| DailyRow::from(d),
                |d| d.date.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PipelineCommand::Start { force } => control(ctx, global, PipelineAction::Start, force).await,
        PipelineCommand::Stop { force } => control(ctx, global, PipelineAction::Stop, force).await,
        PipelineCommand::Trigger => control(ctx, global, PipelineAction::Trigger, false).await,
        PipelineCommand::RetryFailed { force } => {
            control(ctx, global, PipelineAction::RetryFailed, force).await
        }

        PipelineCommand::Watch { interval } => {
            let view = views::pipeline_dashboard_every(client, Duration::from_secs(interval.max(1)));
            util::watch(&view, global, |dashboard| {
                output::render_single(
                    global.output,
                    dashboard,
                    |d| summary_detail(&d.summary),
                    |d| state_label(d.summary.status.status).to_owned(),
                )
            })
            .await
        }

        PipelineCommand::Config(args) => match args.command {
            PipelineConfigCommand::Show => {
                let config = client.get_pipeline_config().await.map_err(CoreError::from)?;
                print_settings(&config, global)
            }
            PipelineConfigCommand::Set { pairs } => {
                let view = ctx.console.pipeline_settings();
                let current = util::first_snapshot(&view).await?;

                let mut settings = PipelineSettings::from_config(&current);
                for (key, value) in parse_pairs(&pairs)? {
                    settings.set(key, value)?;
                }

                let dispatcher = ctx.console.dispatcher(view.handle());
                util::run_action(&dispatcher, "save", global, || async move {
                    settings.save(client).await
                })
                .await?;

                // The dispatcher reloads the view once the backend settles.
                if !global.quiet {
                    if let Some(config) = view.next_result().await.and_then(|s| s.data) {
                        print_settings(&config, global)?;
                    }
                }
                Ok(())
            }
        },
    }
}

/// Run a scheduler control against the current dashboard.
async fn control(
    ctx: &Context,
    global: &GlobalOpts,
    action: PipelineAction,
    force: bool,
) -> Result<(), CliError> {
    let palette = Palette::new(global);
    let view = ctx.console.pipeline_dashboard();
    let dashboard = util::first_snapshot(&view).await?;

    if let Some(reason) = action.disabled_reason(&dashboard.summary) {
        if !force {
            return Err(CliError::ActionUnavailable {
                action: action.to_string(),
                reason: reason.into(),
            });
        }
        output::notice(
            global,
            &palette.warning(&format!("Sending {action} although {reason}")),
        );
    }

    let dispatcher = ctx.console.dispatcher(view.handle());
    let client = ctx.console.client();
    util::run_action(&dispatcher, action.as_ref(), global, || action.run(client)).await?;

    if !global.quiet {
        if let Some(dashboard) = view.next_result().await.and_then(|s| s.data) {
            output::notice(global, &palette.dim(&status_line(&dashboard.summary.status)));
        }
    }
    Ok(())
}
