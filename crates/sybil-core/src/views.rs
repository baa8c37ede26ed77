// ── Console pages ──
//
// Each page polls a fixed set of resources. Resources of one page are
// fetched concurrently and applied together: if any of them fails, the
// whole snapshot stays as it was.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use sybil_api::{
    DailyStats, DashboardSummary, ErrorsByType, GDriveFileStats, GDriveFileStatus, GDriveStatus,
    OtterTranscript, OtterTranscriptStats, PipelineConfigMap, PipelineError, PipelineRun,
    SybilClient, TranscriptQuery, WhitelistEntry, WhitelistStats,
};

use crate::error::CoreError;
use crate::poller::Poller;

// ── Intervals and limits ────────────────────────────────────────────

pub const PIPELINE_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const GDRIVE_POLL_INTERVAL: Duration = Duration::from_secs(10);

pub const DASHBOARD_DAYS: u32 = 14;
pub const RUNS_LIMIT: u32 = 100;
pub const ERRORS_LIMIT: u32 = 100;
pub const GDRIVE_FILES_LIMIT: u32 = 100;

// ── Snapshots ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PipelineDashboard {
    pub summary: DashboardSummary,
    pub daily: Vec<DailyStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineErrors {
    pub errors: Vec<PipelineError>,
    pub by_type: ErrorsByType,
}

#[derive(Debug, Clone, Serialize)]
pub struct GDriveMonitor {
    pub files: Vec<GDriveFileStatus>,
    pub stats: GDriveFileStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptsPage {
    pub transcripts: Vec<OtterTranscript>,
    pub stats: OtterTranscriptStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhitelistPage {
    pub entries: Vec<WhitelistEntry>,
    pub stats: WhitelistStats,
}

// ── Constructors ────────────────────────────────────────────────────

/// Summary plus the last two weeks of daily counts, every 30s.
pub fn pipeline_dashboard(client: &SybilClient) -> Poller<PipelineDashboard> {
    pipeline_dashboard_every(client, PIPELINE_POLL_INTERVAL)
}

pub fn pipeline_dashboard_every(
    client: &SybilClient,
    interval: Duration,
) -> Poller<PipelineDashboard> {
    mount(client, Some(interval), |c| async move {
        let (summary, daily) =
            tokio::try_join!(c.pipeline_summary(), c.daily_stats(DASHBOARD_DAYS))?;
        Ok(PipelineDashboard { summary, daily })
    })
}

pub fn pipeline_runs(client: &SybilClient) -> Poller<Vec<PipelineRun>> {
    mount(client, Some(PIPELINE_POLL_INTERVAL), |c| async move {
        c.pipeline_runs(RUNS_LIMIT).await
    })
}

pub fn pipeline_errors(client: &SybilClient) -> Poller<PipelineErrors> {
    mount(client, Some(PIPELINE_POLL_INTERVAL), |c| async move {
        let (errors, by_type) =
            tokio::try_join!(c.pipeline_errors(ERRORS_LIMIT), c.pipeline_errors_by_type())?;
        Ok(PipelineErrors { errors, by_type })
    })
}

/// Loaded once; the settings form refreshes after a save.
pub fn pipeline_settings(client: &SybilClient) -> Poller<PipelineConfigMap> {
    mount(client, None, |c| async move { c.get_pipeline_config().await })
}

pub fn gdrive_monitor(client: &SybilClient, status: Option<GDriveStatus>) -> Poller<GDriveMonitor> {
    gdrive_monitor_every(client, status, GDRIVE_POLL_INTERVAL)
}

pub fn gdrive_monitor_every(
    client: &SybilClient,
    status: Option<GDriveStatus>,
    interval: Duration,
) -> Poller<GDriveMonitor> {
    mount(client, Some(interval), move |c| async move {
        let (files, stats) = tokio::try_join!(
            c.list_gdrive_files(status, GDRIVE_FILES_LIMIT),
            c.gdrive_file_stats()
        )?;
        Ok(GDriveMonitor { files, stats })
    })
}

pub fn otter_transcripts(client: &SybilClient, query: TranscriptQuery) -> Poller<TranscriptsPage> {
    mount(client, None, move |c| async move {
        let (transcripts, stats) =
            tokio::try_join!(c.list_otter_transcripts(&query), c.otter_transcript_stats())?;
        Ok(TranscriptsPage { transcripts, stats })
    })
}

pub fn whitelist(client: &SybilClient, include_inactive: bool) -> Poller<WhitelistPage> {
    mount(client, None, move |c| async move {
        let (entries, stats) =
            tokio::try_join!(c.list_whitelist(include_inactive), c.whitelist_stats())?;
        Ok(WhitelistPage { entries, stats })
    })
}

fn mount<T, F, Fut>(client: &SybilClient, interval: Option<Duration>, fetch: F) -> Poller<T>
where
    T: Send + Sync + 'static,
    F: Fn(SybilClient) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, sybil_api::Error>> + Send + 'static,
{
    let client = client.clone();
    Poller::spawn(
        move || {
            let fut = fetch(client.clone());
            async move { fut.await.map_err(CoreError::from) }
        },
        interval,
    )
}
