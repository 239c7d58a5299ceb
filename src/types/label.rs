use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ALLOWED_LABEL_SOURCES: [&str; 2] = ["manual", "weak_rule"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityLabel {
    pub id: u64,
    pub activity_id: u64,
    pub label_bad: bool,
    pub label_source: String,
    pub label_reason: Option<String>,
    pub label_confidence: Option<f64>,
    pub label_version: u32,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelInput {
    pub label_bad: bool,
    pub label_source: String,
    #[serde(default)]
    pub label_reason: Option<String>,
    #[serde(default)]
    pub label_confidence: Option<f64>,
    #[serde(default = "default_label_version")]
    pub label_version: u32,
    #[serde(default)]
    pub created_by: Option<String>,
}

fn default_label_version() -> u32 {
    1
}

impl LabelInput {
    pub fn validate(&self) -> Result<(), String> {
        if !ALLOWED_LABEL_SOURCES.contains(&self.label_source.as_str()) {
            let mut allowed = ALLOWED_LABEL_SOURCES.to_vec();
            allowed.sort_unstable();
            return Err(format!("label_source must be one of: {}", allowed.join(", ")));
        }
        if let Some(confidence) = self.label_confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err("label_confidence must be between 0 and 1".to_string());
            }
        }
        if self.label_version < 1 {
            return Err("label_version must be at least 1".to_string());
        }
        if self
            .created_by
            .as_ref()
            .is_some_and(|who| who.chars().count() > 128)
        {
            return Err("created_by must be at most 128 characters".to_string());
        }
        Ok(())
    }
}

/// Optional filters for label listing.
#[derive(Debug, Clone, Default)]
pub struct LabelFilter {
    pub label_bad: Option<bool>,
    pub label_source: Option<String>,
    pub activity_id: Option<u64>,
}

impl LabelFilter {
    pub fn matches(&self, label: &QualityLabel) -> bool {
        self.label_bad.map_or(true, |bad| label.label_bad == bad)
            && self
                .label_source
                .as_deref()
                .map_or(true, |source| label.label_source == source)
            && self.activity_id.map_or(true, |id| label.activity_id == id)
    }
}
