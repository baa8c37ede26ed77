//! Google Drive ingestion handlers.

use std::time::Duration;

use bytesize::ByteSize;
use tabled::Tabled;

use sybil_api::{GDriveFileStats, GDriveFileStatus, GDriveStatus};
use sybil_core::{ActionDispatcher, CoreError, views};

use crate::cli::{FileStatusArg, GdriveArgs, GdriveCommand, GlobalOpts};
use crate::commands::util;
use crate::config::Context;
use crate::error::CliError;
use crate::output;

impl From<FileStatusArg> for GDriveStatus {
    fn from(arg: FileStatusArg) -> Self {
        match arg {
            FileStatusArg::Pending => Self::Pending,
            FileStatusArg::Processing => Self::Processing,
            FileStatusArg::Success => Self::Success,
            FileStatusArg::Failed => Self::Failed,
        }
    }
}

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "File ID")]
    file_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Completed")]
    completed: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl From<&GDriveFileStatus> for FileRow {
    fn from(f: &GDriveFileStatus) -> Self {
        Self {
            file_id: f.file_id.clone(),
            name: output::truncate(&f.file_name, 40),
            size: f.file_size.map_or_else(|| "-".into(), |b| ByteSize::b(b).to_string()),
            status: f.status.as_str(),
            completed: output::opt(f.processing_completed_at.as_deref()),
            error: output::truncate(&output::opt(f.error_message.as_deref()), 40),
        }
    }
}

fn stats_detail(s: &GDriveFileStats) -> String {
    format!(
        "Total:       {}\nPending:     {}\nProcessing:  {}\nSucceeded:   {}\nFailed:      {}",
        s.total, s.pending, s.processing, s.success, s.failed
    )
}

fn render_files(files: &[GDriveFileStatus], global: &GlobalOpts) -> Result<String, CliError> {
    output::render_list(
        global.output,
        files,
        |f| FileRow::from(f),
        GDriveFileStatus::drive_link,
    )
}

pub async fn handle(ctx: &Context, args: GdriveArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let client = ctx.console.client();

    match args.command {
        GdriveCommand::Files { status, limit } => {
            let files = client
                .list_gdrive_files(status.map(Into::into), limit)
                .await
                .map_err(CoreError::from)?;
            output::print_output(&render_files(&files, global)?, global.quiet);
            Ok(())
        }

        GdriveCommand::Stats => {
            let stats = client.gdrive_file_stats().await.map_err(CoreError::from)?;
            let out = output::render_single(global.output, &stats, stats_detail, |s| {
                s.total.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GdriveCommand::Retry { file_id } => {
            let dispatcher = ActionDispatcher::new(ctx.console.config().settle_delay);
            util::run_action(&dispatcher, "retry", global, || async move {
                let resp = client.retry_gdrive_file(&file_id).await?;
                Ok::<_, CoreError>(if resp.message.is_empty() {
                    format!("Queued {file_id} for reprocessing")
                } else {
                    resp.message
                })
            })
            .await?;
            Ok(())
        }

        GdriveCommand::Watch { status, interval } => {
            let view = views::gdrive_monitor_every(
                client,
                status.map(Into::into),
                Duration::from_secs(interval.max(1)),
            );
            util::watch(&view, global, |page| {
                let summary = format!(
                    "{} files: {} pending, {} processing, {} succeeded, {} failed",
                    page.stats.total,
                    page.stats.pending,
                    page.stats.processing,
                    page.stats.success,
                    page.stats.failed
                );
                match global.output {
                    crate::cli::OutputFormat::Table => {
                        Ok(format!("{}\n{summary}", render_files(&page.files, global)?))
                    }
                    _ => output::render_single(global.output, page, |_| summary.clone(), |_| {
                        summary.clone()
                    }),
                }
            })
            .await
        }
    }
}
