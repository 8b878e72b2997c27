use crate::{
    config::PipelineConfig,
    error::{classify_provider_error, GenerationError},
    gemini::{ContentPart, ImageProvider, ProviderCall},
    logger,
    models::{GenerationRequest, GenerationResult, PipelinePhase, DEFAULT_MIME_TYPE},
};
use base64::Engine;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Turns a [`GenerationRequest`] into a [`GenerationResult`], publishing each
/// phase on a watch channel.
///
/// At most one submission is in flight. A second `submit` while the phase is
/// Parsing, Rendering or Finishing fails with
/// [`GenerationError::AlreadyInProgress`] and changes nothing.
#[derive(Clone)]
pub struct GenerationPipeline {
    provider: Arc<dyn ImageProvider>,
    model: String,
    config: PipelineConfig,
    phase: Arc<watch::Sender<PipelinePhase>>,
    attempts: Arc<AtomicU64>,
}

impl GenerationPipeline {
    pub fn new(
        provider: Arc<dyn ImageProvider>,
        model: impl Into<String>,
        config: PipelineConfig,
    ) -> Self {
        let (phase, _) = watch::channel(PipelinePhase::Idle);
        Self {
            provider,
            model: model.into(),
            config,
            phase: Arc::new(phase),
            attempts: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn phase(&self) -> PipelinePhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelinePhase> {
        self.phase.subscribe()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn submit(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        if request.prompt.trim().is_empty() {
            return Err(GenerationError::Validation);
        }

        let started = self.phase.send_if_modified(|phase| {
            if phase.is_in_flight() {
                false
            } else {
                *phase = PipelinePhase::Parsing;
                true
            }
        });
        if !started {
            log::warn!("Rejected submission: a generation is already in progress");
            return Err(GenerationError::AlreadyInProgress);
        }
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let guard = InFlight::new(self, attempt);

        let call = ProviderCall {
            model: self.model.clone(),
            prompt: request.effective_prompt(),
            aspect_ratio: request.aspect_ratio,
        };
        dwell(self.config.parsing_dwell).await;

        self.phase.send_replace(PipelinePhase::Rendering);
        let parts = match self.render(call).await {
            Ok(parts) => parts,
            Err(e) => {
                guard.settle(PipelinePhase::Error);
                return Err(e);
            }
        };

        let result = match extract_image(parts) {
            Ok(result) => result,
            Err(e) => {
                log::error!("Gemini image generation error: {}", e);
                guard.settle(PipelinePhase::Error);
                return Err(e);
            }
        };

        self.phase.send_replace(PipelinePhase::Finishing);
        dwell(self.config.finishing_dwell).await;
        guard.settle(PipelinePhase::Success);
        self.schedule_reset(attempt);

        log::info!(
            "Generated {} bytes of {} (attempt {})",
            result.image_data.len(),
            result.mime_type,
            attempt
        );
        Ok(result)
    }

    async fn render(&self, call: ProviderCall) -> Result<Vec<ContentPart>, GenerationError> {
        let _timer = logger::timer("provider.generate_content");
        let outcome = match self.config.render_timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.provider.generate_content(call)).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        log::error!("Provider call timed out after {:?}", limit);
                        return Err(GenerationError::Unknown(format!(
                            "Request timed out after {} seconds",
                            limit.as_secs_f32()
                        )));
                    }
                }
            }
            None => self.provider.generate_content(call).await,
        };

        outcome.map_err(|e| {
            log::error!("Gemini image generation error: {}", e);
            classify_provider_error(&e.message)
        })
    }

    /// Returns to Idle after the success delay unless a newer attempt started.
    fn schedule_reset(&self, attempt: u64) {
        let phase = Arc::clone(&self.phase);
        let attempts = Arc::clone(&self.attempts);
        let delay = self.config.success_reset;
        tokio::spawn(async move {
            dwell(delay).await;
            phase.send_if_modified(|current| {
                if *current == PipelinePhase::Success && attempts.load(Ordering::SeqCst) == attempt
                {
                    *current = PipelinePhase::Idle;
                    true
                } else {
                    false
                }
            });
        });
    }
}

/// Owns the in-flight phase of one attempt. If the submitting future is
/// dropped before a terminal phase is reached, the pipeline goes back to Idle.
struct InFlight {
    phase: Arc<watch::Sender<PipelinePhase>>,
    attempts: Arc<AtomicU64>,
    attempt: u64,
    settled: bool,
}

impl InFlight {
    fn new(pipeline: &GenerationPipeline, attempt: u64) -> Self {
        Self {
            phase: Arc::clone(&pipeline.phase),
            attempts: Arc::clone(&pipeline.attempts),
            attempt,
            settled: false,
        }
    }

    fn settle(mut self, outcome: PipelinePhase) {
        self.settled = true;
        self.phase.send_replace(outcome);
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.settled || self.attempts.load(Ordering::SeqCst) != self.attempt {
            return;
        }
        let abandoned = self.phase.send_if_modified(|current| {
            if current.is_in_flight() {
                *current = PipelinePhase::Idle;
                true
            } else {
                false
            }
        });
        if abandoned {
            log::warn!("Generation attempt {} was cancelled", self.attempt);
        }
    }
}

async fn dwell(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// First part carrying inline image data wins.
fn extract_image(parts: Vec<ContentPart>) -> Result<GenerationResult, GenerationError> {
    let inline = parts
        .into_iter()
        .filter_map(|part| part.inline_data)
        .find(|data| !data.data.is_empty())
        .ok_or(GenerationError::NoImageData)?;

    let image_data = base64::engine::general_purpose::STANDARD
        .decode(inline.data.trim())
        .map_err(|e| GenerationError::Unknown(format!("Failed to decode image data: {}", e)))?;

    let mime_type = inline
        .mime_type
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

    Ok(GenerationResult {
        image_data,
        mime_type,
    })
}
