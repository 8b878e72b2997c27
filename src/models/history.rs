use super::generation::{ArtStyle, AspectRatio, GenerationRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A remembered submission: its parameters, never its image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub prompt: String,
    pub style: ArtStyle,
    pub ratio: AspectRatio,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn to_request(&self) -> GenerationRequest {
        GenerationRequest {
            prompt: self.prompt.clone(),
            style: self.style,
            aspect_ratio: self.ratio,
        }
    }
}
