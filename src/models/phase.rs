use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of the single in-flight submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelinePhase {
    #[default]
    Idle,
    Parsing,
    Rendering,
    Finishing,
    Success,
    Error,
}

impl PipelinePhase {
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            PipelinePhase::Parsing | PipelinePhase::Rendering | PipelinePhase::Finishing
        )
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelinePhase::Idle => "IDLE",
            PipelinePhase::Parsing => "PARSING",
            PipelinePhase::Rendering => "RENDERING",
            PipelinePhase::Finishing => "FINISHING",
            PipelinePhase::Success => "SUCCESS",
            PipelinePhase::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// What a front end needs to render the generate control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub label: &'static str,
    pub is_busy: bool,
    pub is_retryable: bool,
}
