// ── Pipeline controls and settings ──
//
// The four dashboard controls and when each is offered, plus the editable
// pipeline settings with their fallbacks.

use std::collections::BTreeMap;

use strum::{AsRefStr, Display, EnumIter, EnumString};
use sybil_api::{DashboardSummary, PipelineConfigMap, SybilClient};

use crate::error::CoreError;

// ── Actions ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum PipelineAction {
    Start,
    Stop,
    Trigger,
    RetryFailed,
}

impl PipelineAction {
    /// Why the dashboard would grey this control out, if it would.
    pub fn disabled_reason(self, summary: &DashboardSummary) -> Option<&'static str> {
        match self {
            Self::Start if summary.status.is_running => Some("the pipeline is already running"),
            Self::Stop if !summary.status.is_running => Some("the pipeline is not running"),
            Self::RetryFailed if summary.processing.failed_transcripts == 0 => {
                Some("there are no failed transcripts")
            }
            _ => None,
        }
    }

    pub fn is_enabled(self, summary: &DashboardSummary) -> bool {
        self.disabled_reason(summary).is_none()
    }

    /// Issue the backend call and return its confirmation message.
    pub async fn run(self, client: &SybilClient) -> Result<String, CoreError> {
        let resp = match self {
            Self::Start => client.start_pipeline().await?,
            Self::Stop => client.stop_pipeline().await?,
            Self::Trigger => client.trigger_pipeline().await?,
            Self::RetryFailed => client.retry_failed_transcripts().await?,
        };
        Ok(if resp.message.is_empty() {
            format!("{self} requested")
        } else {
            resp.message
        })
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Editable pipeline settings and the value used when the backend has none.
pub const PIPELINE_SETTING_DEFAULTS: [(&str, &str); 4] = [
    ("poll_interval_seconds", "300"),
    ("batch_size", "10"),
    ("max_retries", "3"),
    ("enabled", "true"),
];

/// The settings form: one string value per known key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    values: BTreeMap<String, String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            values: PIPELINE_SETTING_DEFAULTS
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        }
    }
}

impl PipelineSettings {
    /// Populate from the backend map; empty or missing values fall back.
    pub fn from_config(config: &PipelineConfigMap) -> Self {
        let mut settings = Self::default();
        for (key, value) in &mut settings.values {
            if let Some(current) = config.get(key).filter(|c| !c.value.is_empty()) {
                value.clone_from(&current.value);
            }
        }
        settings
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set a known setting after checking its shape.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let Some(slot) = self.values.get_mut(key) else {
            return Err(CoreError::Validation {
                field: key.into(),
                reason: format!(
                    "unknown setting; expected one of {}",
                    PIPELINE_SETTING_DEFAULTS
                        .iter()
                        .map(|(k, _)| *k)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            });
        };

        let value = value.trim();
        let valid = match key {
            "enabled" => matches!(value, "true" | "false"),
            _ => value.parse::<u32>().is_ok_and(|n| n > 0 || key == "max_retries"),
        };
        if !valid {
            return Err(CoreError::Validation {
                field: key.into(),
                reason: if key == "enabled" {
                    "expected true or false".into()
                } else {
                    "expected a whole number".into()
                },
            });
        }

        value.clone_into(slot);
        Ok(())
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Persist the full form.
    pub async fn save(&self, client: &SybilClient) -> Result<String, CoreError> {
        let resp = client.update_pipeline_config(&self.values).await?;
        Ok(if resp.message.is_empty() {
            "Configuration saved successfully!".into()
        } else {
            resp.message
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;
    use strum::IntoEnumIterator;

    use super::*;

    fn summary(is_running: bool, failed: u64) -> DashboardSummary {
        serde_json::from_value(json!({
            "status": {
                "status": if is_running { "running" } else { "stopped" },
                "is_running": is_running,
                "circuit_breaker_open": false,
                "consecutive_failures": 0,
                "interval_seconds": 300
            },
            "processing": {
                "processed_transcripts": 120,
                "failed_transcripts": failed,
                "pending_transcripts": 4,
                "total_chunks": 900,
                "total_entities": 3000,
                "total_relationships": 4100,
                "success_rate_7d": 97.5
            },
            "performance": {
                "avg_processing_time_ms": 1200.0,
                "p95_processing_time_ms": 4000.0,
                "transcripts_per_hour": 12.0
            },
            "data_quality": {
                "avg_entities_per_transcript": 25.0,
                "avg_relationships_per_transcript": 34.2
            },
            "recent_errors_count": failed,
            "last_updated": "2025-03-01T10:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn gating_follows_running_state() {
        let running = summary(true, 2);
        assert!(!PipelineAction::Start.is_enabled(&running));
        assert!(PipelineAction::Stop.is_enabled(&running));

        let stopped = summary(false, 2);
        assert!(PipelineAction::Start.is_enabled(&stopped));
        assert!(!PipelineAction::Stop.is_enabled(&stopped));
    }

    #[test]
    fn retry_failed_needs_failures() {
        assert!(!PipelineAction::RetryFailed.is_enabled(&summary(true, 0)));
        assert!(PipelineAction::RetryFailed.is_enabled(&summary(true, 1)));
    }

    #[test]
    fn trigger_is_always_enabled() {
        for s in [summary(true, 0), summary(false, 0)] {
            assert!(PipelineAction::Trigger.is_enabled(&s));
        }
    }

    #[test]
    fn names_are_kebab_case() {
        let names: Vec<String> = PipelineAction::iter().map(|a| a.to_string()).collect();
        assert_eq!(names, ["start", "stop", "trigger", "retry-failed"]);
        assert_eq!(
            "retry-failed".parse::<PipelineAction>().unwrap(),
            PipelineAction::RetryFailed
        );
    }

    #[test]
    fn settings_fall_back_to_defaults() {
        let config: PipelineConfigMap = serde_json::from_value(json!({
            "batch_size": {"value": "25", "type": "int", "description": "", "updated_at": null},
            "enabled": {"value": "", "type": "bool", "description": "", "updated_at": null}
        }))
        .unwrap();
        let settings = PipelineSettings::from_config(&config);
        assert_eq!(settings.get("batch_size"), Some("25"));
        assert_eq!(settings.get("enabled"), Some("true"));
        assert_eq!(settings.get("poll_interval_seconds"), Some("300"));
        assert_eq!(settings.get("max_retries"), Some("3"));
    }

    #[test]
    fn settings_validate_values() {
        let mut settings = PipelineSettings::default();
        settings.set("batch_size", " 50 ").unwrap();
        assert_eq!(settings.get("batch_size"), Some("50"));
        settings.set("max_retries", "0").unwrap();

        assert!(settings.set("batch_size", "0").is_err());
        assert!(settings.set("enabled", "yes").is_err());
        assert!(settings.set("poll_interval_seconds", "-5").is_err());
        assert!(settings.set("colour", "blue").is_err());
    }
}
