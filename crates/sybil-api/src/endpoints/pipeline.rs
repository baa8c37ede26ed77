// Transcript processing pipeline: status, history, settings and controls

use std::collections::BTreeMap;

use crate::client::SybilClient;
use crate::error::Error;
use crate::types::{
    ActionResponse, DailyStats, DashboardSummary, ErrorsByType, PipelineConfigMap, PipelineError,
    PipelineRun, PipelineStatus,
};

impl SybilClient {
    // ── Status ───────────────────────────────────────────────────────

    /// `GET /admin/otter/status`
    pub async fn pipeline_status(&self) -> Result<PipelineStatus, Error> {
        let url = self.url("/admin/otter/status")?;
        self.get(url).await
    }

    /// `GET /admin/otter/summary`
    pub async fn pipeline_summary(&self) -> Result<DashboardSummary, Error> {
        let url = self.url("/admin/otter/summary")?;
        self.get(url).await
    }

    /// `GET /admin/otter/daily-stats?days=<n>`
    pub async fn daily_stats(&self, days: u32) -> Result<Vec<DailyStats>, Error> {
        let url = self.url_with_query("/admin/otter/daily-stats", &[("days", days.to_string())])?;
        self.get(url).await
    }

    // ── History ──────────────────────────────────────────────────────

    /// `GET /admin/otter/runs?limit=<n>`
    pub async fn pipeline_runs(&self, limit: u32) -> Result<Vec<PipelineRun>, Error> {
        let url = self.url_with_query("/admin/otter/runs", &[("limit", limit.to_string())])?;
        self.get(url).await
    }

    /// `GET /admin/otter/errors?limit=<n>`
    pub async fn pipeline_errors(&self, limit: u32) -> Result<Vec<PipelineError>, Error> {
        let url = self.url_with_query("/admin/otter/errors", &[("limit", limit.to_string())])?;
        self.get(url).await
    }

    /// `GET /admin/otter/errors/by-type`
    pub async fn pipeline_errors_by_type(&self) -> Result<ErrorsByType, Error> {
        let url = self.url("/admin/otter/errors/by-type")?;
        self.get(url).await
    }

    // ── Settings ─────────────────────────────────────────────────────

    /// `GET /admin/otter/config`
    pub async fn get_pipeline_config(&self) -> Result<PipelineConfigMap, Error> {
        let url = self.url("/admin/otter/config")?;
        self.get(url).await
    }

    /// Write setting values. Values are strings regardless of their type.
    ///
    /// `PUT /admin/otter/config`
    pub async fn update_pipeline_config(
        &self,
        values: &BTreeMap<String, String>,
    ) -> Result<ActionResponse, Error> {
        let url = self.url("/admin/otter/config")?;
        self.put(url, values).await
    }

    // ── Controls ─────────────────────────────────────────────────────

    /// `POST /admin/otter/start`
    pub async fn start_pipeline(&self) -> Result<ActionResponse, Error> {
        self.pipeline_control("start").await
    }

    /// `POST /admin/otter/stop`
    pub async fn stop_pipeline(&self) -> Result<ActionResponse, Error> {
        self.pipeline_control("stop").await
    }

    /// Run one processing cycle now, outside the schedule.
    ///
    /// `POST /admin/otter/trigger`
    pub async fn trigger_pipeline(&self) -> Result<ActionResponse, Error> {
        self.pipeline_control("trigger").await
    }

    /// `POST /admin/otter/retry-failed`
    pub async fn retry_failed_transcripts(&self) -> Result<ActionResponse, Error> {
        self.pipeline_control("retry-failed").await
    }

    async fn pipeline_control(&self, action: &str) -> Result<ActionResponse, Error> {
        let url = self.url(&format!("/admin/otter/{action}"))?;
        self.post(url, None::<&()>).await
    }
}
