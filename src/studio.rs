use crate::{
    config::Config,
    error::{Result, StudioError},
    gemini::GeminiImageClient,
    history::{FileCache, PromptHistory},
    models::{GenerationRequest, HistoryEntry, PipelinePhase, Project, StatusView},
    pipeline::GenerationPipeline,
    registry::AssetRegistry,
    status,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// One generator session: pipeline, prompt history and the asset list it feeds.
pub struct Studio {
    pipeline: GenerationPipeline,
    history: Mutex<PromptHistory>,
    registry: Arc<AssetRegistry>,
    last_failed: Mutex<Option<GenerationRequest>>,
}

impl Studio {
    pub fn new(
        pipeline: GenerationPipeline,
        history: PromptHistory,
        registry: Arc<AssetRegistry>,
    ) -> Self {
        Self {
            pipeline,
            history: Mutex::new(history),
            registry,
            last_failed: Mutex::new(None),
        }
    }

    /// Wires the Gemini client and the file-backed history from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = Arc::new(GeminiImageClient::new(&config.gemini)?);
        let pipeline =
            GenerationPipeline::new(provider, config.gemini.model.clone(), config.pipeline.clone());
        let cache = Arc::new(FileCache::new(config.history.path.clone()));
        let history = PromptHistory::open(cache, &config.history);
        log::debug!("History loaded: {:?}", history.last_load());

        Ok(Self::new(pipeline, history, Arc::new(AssetRegistry::new())))
    }

    pub fn phase(&self) -> PipelinePhase {
        self.pipeline.phase()
    }

    pub fn status(&self) -> StatusView {
        status::project(self.pipeline.phase())
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelinePhase> {
        self.pipeline.subscribe()
    }

    pub fn registry(&self) -> &Arc<AssetRegistry> {
        &self.registry
    }

    /// Runs one submission. On success the asset is registered and the
    /// user's own prompt (not the styled one) goes into history.
    pub async fn generate(&self, request: GenerationRequest) -> Result<Project> {
        let outcome = self.pipeline.submit(&request).await;
        match outcome {
            Ok(result) => {
                let project = self.registry.register(&request.prompt, result)?;
                self.lock_history()?.record(&request);
                *self.lock_failed()? = None;
                Ok(project)
            }
            Err(e) => {
                if e.is_provider_failure() {
                    *self.lock_failed()? = Some(request);
                }
                Err(e.into())
            }
        }
    }

    /// Resubmits the last failed request. Only valid while in the Error phase.
    ///
    /// The phase check and the read of the failed request happen under one
    /// lock. A `generate` that starts after that still wins the pipeline, and
    /// the retry then fails with [`crate::GenerationError::AlreadyInProgress`].
    pub async fn retry(&self) -> Result<Project> {
        let request = {
            let failed = self.lock_failed()?;
            if self.pipeline.phase() != PipelinePhase::Error {
                return Err(StudioError::RequestError(
                    "Nothing to retry: last generation did not fail".into(),
                ));
            }
            failed
                .clone()
                .ok_or_else(|| StudioError::RequestError("No failed generation to retry".into()))?
        };
        log::info!("Retrying generation: {}", request.prompt);
        self.generate(request).await
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history
            .lock()
            .map(|history| history.list().to_vec())
            .unwrap_or_default()
    }

    pub fn reuse(&self, id: &str) -> Option<GenerationRequest> {
        self.history.lock().ok()?.reuse(id)
    }

    fn lock_history(&self) -> Result<MutexGuard<'_, PromptHistory>> {
        self.history
            .lock()
            .map_err(|_| StudioError::StorageError("history lock poisoned".into()))
    }

    fn lock_failed(&self) -> Result<MutexGuard<'_, Option<GenerationRequest>>> {
        self.last_failed
            .lock()
            .map_err(|_| StudioError::StorageError("retry slot lock poisoned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HistoryConfig, PipelineConfig};
    use crate::error::GenerationError;
    use crate::gemini::ProviderError;
    use crate::history::MemoryCache;
    use crate::models::{ArtStyle, AspectRatio};
    use crate::pipeline::tests::{png_part, FakeProvider};
    use std::time::Duration;

    fn studio(provider: Arc<FakeProvider>) -> Studio {
        let config = PipelineConfig::instant().with_success_reset(Duration::from_secs(3600));
        let pipeline = GenerationPipeline::new(provider, "gemini-2.5-flash-image", config);
        let history = PromptHistory::open(Arc::new(MemoryCache::new()), &HistoryConfig::default());
        Studio::new(pipeline, history, Arc::new(AssetRegistry::new()))
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("a neon city", ArtStyle::Cyberpunk, AspectRatio::Landscape16x9)
            .unwrap()
    }

    #[tokio::test]
    async fn test_success_registers_and_records_original_prompt() {
        let provider = Arc::new(FakeProvider::new(vec![Ok(vec![png_part()])]));
        let studio = studio(provider);

        let project = studio.generate(request()).await.unwrap();

        assert_eq!(project.title, "a neon city");
        assert_eq!(studio.registry().len(), 1);
        let history = studio.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].prompt, "a neon city");
        assert_eq!(history[0].style, ArtStyle::Cyberpunk);
        assert_eq!(studio.status().label, "Complete!");
    }

    #[tokio::test]
    async fn test_failure_records_nothing_and_allows_retry() {
        let provider = Arc::new(FakeProvider::new(vec![
            Err(ProviderError::new("SAFETY: blocked")),
            Ok(vec![png_part()]),
        ]));
        let studio = studio(provider.clone());

        let err = studio.generate(request()).await.unwrap_err();
        assert!(matches!(
            err,
            StudioError::Generation(GenerationError::SafetyBlocked)
        ));
        assert!(studio.history().is_empty());
        assert!(studio.registry().is_empty());
        assert!(studio.status().is_retryable);

        let project = studio.retry().await.unwrap();
        assert_eq!(project.title, "a neon city");
        assert_eq!(provider.call_count(), 2);
        assert_eq!(studio.history().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_without_failure_is_rejected() {
        let provider = Arc::new(FakeProvider::new(vec![]));
        let studio = studio(provider.clone());
        assert!(studio.retry().await.is_err());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_retry_while_generating_does_not_resubmit() {
        let provider = Arc::new(
            FakeProvider::new(vec![
                Err(ProviderError::new("[429] quota")),
                Ok(vec![png_part()]),
            ])
            .with_delay(Duration::from_millis(100)),
        );
        let studio = Arc::new(studio(provider.clone()));
        assert!(studio.generate(request()).await.is_err());

        let running = Arc::clone(&studio);
        let handle = tokio::spawn(async move { running.generate(request()).await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let err = studio.retry().await.unwrap_err();
        assert!(err.to_string().contains("Nothing to retry"));

        handle.await.unwrap().unwrap();
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_reuse_history_entry() {
        let provider = Arc::new(FakeProvider::new(vec![Ok(vec![png_part()])]));
        let studio = studio(provider);
        studio.generate(request()).await.unwrap();

        let id = studio.history()[0].id.clone();
        assert_eq!(studio.reuse(&id), Some(request()));
    }
}
