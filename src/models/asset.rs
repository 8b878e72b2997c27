use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Completed,
    Processing,
    Failed,
}

/// A generated artifact as listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    /// `data:` URL carrying the image bytes.
    pub image_url: String,
    pub mime_type: String,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
}
