use crate::models::{PipelinePhase, StatusView};

/// Label and control state for the generate button in a given phase.
pub fn project(phase: PipelinePhase) -> StatusView {
    let label = match phase {
        PipelinePhase::Parsing => "Parsing message...",
        PipelinePhase::Rendering => "Rendering image...",
        PipelinePhase::Finishing => "Finishing...",
        PipelinePhase::Success => "Complete!",
        PipelinePhase::Idle | PipelinePhase::Error => "Generate",
    };

    StatusView {
        label,
        is_busy: phase.is_in_flight(),
        is_retryable: phase == PipelinePhase::Error,
    }
}
