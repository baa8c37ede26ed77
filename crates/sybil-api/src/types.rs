// Wire types for the Sybil admin backend.
//
// Field names match the backend JSON exactly. Backend timestamps are kept
// as the strings the server sends; the console only displays them.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ── Auth ─────────────────────────────────────────────────────────────

/// Identity record returned by `POST /admin/auth/login`.
///
/// Only `username` and `email` are interpreted; anything else the backend
/// sends is carried through `extra` so persisting a session never drops it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AdminUser {
    /// Best human-readable label for this user.
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("admin")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub user: AdminUser,
}

/// Generic `{message}` acknowledgement returned by action endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub message: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Chat ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub timestamp: String,
}

// ── Whitelist ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    pub id: i64,
    pub phone_number: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub added_by: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WhitelistCreateRequest {
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_by: Option<String>,
}

/// Partial update; unset fields are left untouched by the backend.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WhitelistUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl WhitelistUpdateRequest {
    pub fn is_empty(&self) -> bool {
        self.phone_number.is_none()
            && self.name.is_none()
            && self.notes.is_none()
            && self.is_active.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
}

// ── Prompt configuration ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptConfig {
    pub tone: String,
    pub use_smart_brevity: bool,
    pub people_references: String,
    pub use_formatting: bool,
    pub use_emojis: bool,
    pub default_response_length: String,
    pub ask_about_depth: bool,
    pub tone_adapts_by_user: bool,
    #[serde(default)]
    pub custom_instructions: String,
}

// ── Google Drive ingestion ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GDriveStatus {
    Pending,
    Processing,
    Success,
    Failed,
    /// A status this client does not know yet.
    #[serde(other)]
    Unknown,
}

impl GDriveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GDriveFileStatus {
    pub id: i64,
    pub file_id: String,
    pub file_name: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    pub status: GDriveStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub processing_started_at: Option<String>,
    #[serde(default)]
    pub processing_completed_at: Option<String>,
}

impl GDriveFileStatus {
    /// Browser link to the source document.
    pub fn drive_link(&self) -> String {
        format!("https://drive.google.com/file/d/{}/view", self.file_id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GDriveFileStats {
    pub total: u64,
    pub pending: u64,
    pub processing: u64,
    pub success: u64,
    pub failed: u64,
}

// ── Otter transcripts ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptStatus {
    Processed,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptSort {
    #[default]
    Date,
    Title,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Team,
    Private,
}

impl TranscriptSort {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Title => "title",
        }
    }
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl CallType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Private => "private",
        }
    }
}

/// Query for `GET /admin/otter/transcripts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscriptQuery {
    pub sort_by: TranscriptSort,
    pub order: SortOrder,
    pub call_type: Option<CallType>,
    pub include_failed: bool,
}

impl Default for TranscriptQuery {
    fn default() -> Self {
        Self {
            sort_by: TranscriptSort::Date,
            order: SortOrder::Desc,
            call_type: None,
            include_failed: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtterTranscript {
    pub conversation_id: String,
    pub title: String,
    pub status: TranscriptStatus,
    #[serde(default)]
    pub call_type: Option<CallType>,
    #[serde(default)]
    pub doc_id: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub processed_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OtterTranscriptStats {
    pub total_processed: u64,
    #[serde(default)]
    pub team_calls_count: Option<u64>,
    #[serde(default)]
    pub private_calls_count: Option<u64>,
    #[serde(default)]
    pub failed_count: Option<u64>,
    #[serde(default)]
    pub last_processed: Option<String>,
}

/// Call classification settings for transcript filing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtterConfig {
    #[serde(default)]
    pub team_call_indicators: Vec<String>,
    #[serde(default)]
    pub team_calls_folder_name: String,
    #[serde(default)]
    pub private_folder_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `PUT /admin/otter/transcripts/config`; unset fields are kept.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OtterConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_call_indicators: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_calls_folder_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_folder_name: Option<String>,
}

// ── Pipeline ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    Running,
    Stopped,
    Error,
    Paused,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub status: PipelineState,
    pub is_running: bool,
    pub circuit_breaker_open: bool,
    pub consecutive_failures: u32,
    pub interval_seconds: u64,
    #[serde(default)]
    pub last_run_at: Option<String>,
    #[serde(default)]
    pub next_scheduled_run: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub processed_transcripts: u64,
    pub failed_transcripts: u64,
    pub pending_transcripts: u64,
    pub total_chunks: u64,
    pub total_entities: u64,
    pub total_relationships: u64,
    pub success_rate_7d: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub avg_processing_time_ms: f64,
    pub p95_processing_time_ms: f64,
    pub transcripts_per_hour: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityStats {
    pub avg_entities_per_transcript: f64,
    pub avg_relationships_per_transcript: f64,
}

/// `GET /admin/otter/summary`: everything the pipeline dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub status: PipelineStatus,
    pub processing: ProcessingStats,
    pub performance: PerformanceStats,
    pub data_quality: DataQualityStats,
    pub recent_errors_count: u64,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: String,
    pub transcripts_processed: u64,
    pub transcripts_failed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Failed,
    Running,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub run_id: String,
    pub status: RunStatus,
    pub started_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    pub transcripts_processed: u64,
    pub transcripts_failed: u64,
    pub transcripts_skipped: u64,
    pub chunks_created: u64,
    pub entities_extracted: u64,
    pub relationships_created: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineError {
    pub id: i64,
    pub run_id: String,
    pub conversation_id: String,
    #[serde(default)]
    pub transcript_title: Option<String>,
    pub error_type: String,
    pub error_message: String,
    pub occurred_at: String,
}

/// Error counts keyed by error type, in the order the backend reports them.
pub type ErrorsByType = IndexMap<String, u64>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfigValue {
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Pipeline settings keyed by setting name.
pub type PipelineConfigMap = BTreeMap<String, PipelineConfigValue>;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn admin_user_keeps_unknown_fields() {
        let user: AdminUser = serde_json::from_value(json!({
            "username": "ops",
            "email": "ops@example.org",
            "role": "superadmin"
        }))
        .unwrap();
        assert_eq!(user.display_name(), "ops");
        assert_eq!(user.extra.get("role"), Some(&json!("superadmin")));

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["role"], "superadmin");
    }

    #[test]
    fn update_request_omits_unset_fields() {
        let req = WhitelistUpdateRequest {
            is_active: Some(false),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({"is_active": false}));
        assert!(!req.is_empty());
        assert!(WhitelistUpdateRequest::default().is_empty());
    }

    #[test]
    fn pipeline_config_value_type_field() {
        let map: PipelineConfigMap = serde_json::from_value(json!({
            "batch_size": {
                "value": "10",
                "type": "int",
                "description": "Transcripts per run",
                "updated_at": "2025-01-01T00:00:00Z"
            }
        }))
        .unwrap();
        assert_eq!(map["batch_size"].value_type, "int");
        assert_eq!(map["batch_size"].value, "10");
    }

    #[test]
    fn errors_by_type_preserves_order() {
        let counts: ErrorsByType =
            serde_json::from_str(r#"{"timeout": 3, "parse": 1, "auth": 7}"#).unwrap();
        let keys: Vec<_> = counts.keys().map(String::as_str).collect();
        assert_eq!(keys, ["timeout", "parse", "auth"]);
    }
}
