// ── Transcript filing ──
//
// Call classification settings and the local status filter applied on top
// of the transcript list.

use strum::{Display, EnumString};
use sybil_api::{OtterConfig, OtterConfigUpdate, OtterTranscript, SybilClient, TranscriptStatus};

use crate::error::CoreError;

/// Indicators used when the backend has none configured.
pub const DEFAULT_TEAM_CALL_INDICATORS: [&str; 13] = [
    "hac team call",
    "all hands",
    "srm discussion",
    "us strategy",
    "ben_chris",
    "team",
    "hac",
    "standup",
    "sync",
    "weekly",
    "daily",
    "meeting",
    "call",
];

pub const DEFAULT_TEAM_CALLS_FOLDER: &str = "Team Calls";
pub const DEFAULT_PRIVATE_FOLDER: &str = "Private";

// ── Status filter ───────────────────────────────────────────────────

/// Client-side filter over the fetched transcript list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Processed,
    Failed,
}

impl StatusFilter {
    pub fn matches(self, transcript: &OtterTranscript) -> bool {
        match self {
            Self::All => true,
            Self::Processed => transcript.status == TranscriptStatus::Processed,
            Self::Failed => transcript.status == TranscriptStatus::Failed,
        }
    }

    pub fn apply<'a>(self, transcripts: &'a [OtterTranscript]) -> Vec<&'a OtterTranscript> {
        transcripts.iter().filter(|t| self.matches(t)).collect()
    }
}

// ── Classification settings ─────────────────────────────────────────

/// Editable copy of the classification config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationSettings {
    pub team_call_indicators: Vec<String>,
    pub team_calls_folder_name: String,
    pub private_folder_name: String,
}

impl Default for ClassificationSettings {
    fn default() -> Self {
        Self {
            team_call_indicators: DEFAULT_TEAM_CALL_INDICATORS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            team_calls_folder_name: DEFAULT_TEAM_CALLS_FOLDER.to_owned(),
            private_folder_name: DEFAULT_PRIVATE_FOLDER.to_owned(),
        }
    }
}

impl ClassificationSettings {
    /// Take the backend config, substituting the default indicator set
    /// when it has none. Blank folder names fall back as well.
    pub fn from_config(config: &OtterConfig) -> Self {
        let defaults = Self::default();
        let or_default = |value: &str, fallback: String| {
            if value.trim().is_empty() {
                fallback
            } else {
                value.to_owned()
            }
        };

        Self {
            team_call_indicators: if config.team_call_indicators.is_empty() {
                defaults.team_call_indicators
            } else {
                config.team_call_indicators.clone()
            },
            team_calls_folder_name: or_default(
                &config.team_calls_folder_name,
                defaults.team_calls_folder_name,
            ),
            private_folder_name: or_default(&config.private_folder_name, defaults.private_folder_name),
        }
    }

    /// Add an indicator, normalized to trimmed lowercase. Returns `false`
    /// for blanks and duplicates.
    pub fn add_indicator(&mut self, indicator: &str) -> bool {
        let normalized = indicator.trim().to_lowercase();
        if normalized.is_empty() || self.team_call_indicators.contains(&normalized) {
            return false;
        }
        self.team_call_indicators.push(normalized);
        true
    }

    pub fn remove_indicator(&mut self, indicator: &str) -> bool {
        let before = self.team_call_indicators.len();
        self.team_call_indicators.retain(|i| i != indicator);
        self.team_call_indicators.len() != before
    }

    pub fn set_folders(&mut self, team: Option<&str>, private: Option<&str>) {
        if let Some(team) = team.map(str::trim).filter(|s| !s.is_empty()) {
            team.clone_into(&mut self.team_calls_folder_name);
        }
        if let Some(private) = private.map(str::trim).filter(|s| !s.is_empty()) {
            private.clone_into(&mut self.private_folder_name);
        }
    }

    pub fn to_update(&self) -> OtterConfigUpdate {
        OtterConfigUpdate {
            team_call_indicators: Some(self.team_call_indicators.clone()),
            team_calls_folder_name: Some(self.team_calls_folder_name.clone()),
            private_folder_name: Some(self.private_folder_name.clone()),
        }
    }

    /// Persist. An empty indicator list is refused locally.
    pub async fn save(&self, client: &SybilClient) -> Result<String, CoreError> {
        if self.team_call_indicators.is_empty() {
            return Err(CoreError::Validation {
                field: "team_call_indicators".into(),
                reason: "at least one indicator is required".into(),
            });
        }
        let updated = client.update_otter_config(&self.to_update()).await?;
        Ok(updated.message.unwrap_or_else(|| {
            "Config saved successfully! Restart service for changes to fully take effect.".into()
        }))
    }
}
