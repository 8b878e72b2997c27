use crate::error::{Result, StudioError};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_API_URL: &str = "http://localhost:7860";
pub const HISTORY_KEY: &str = "prompt_history";
pub const HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .or_else(|_| env::var("GOOGLE_API_KEY"))
            .ok();
        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());
        let base_url =
            env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string());
        let timeout = env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs);

        GeminiConfig {
            api_key,
            model,
            base_url,
            timeout,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            StudioError::ConfigError("GEMINI_API_KEY not set and no API key provided".into())
        })
    }
}

/// Dwell times of the generation pipeline.
///
/// The dwells only exist so a human can read each phase; `instant()` drops them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub parsing_dwell: Duration,
    pub finishing_dwell: Duration,
    pub success_reset: Duration,
    pub render_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            parsing_dwell: Duration::from_millis(800),
            finishing_dwell: Duration::from_millis(600),
            success_reset: Duration::from_secs(2),
            render_timeout: None,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instant() -> Self {
        PipelineConfig {
            parsing_dwell: Duration::ZERO,
            finishing_dwell: Duration::ZERO,
            success_reset: Duration::ZERO,
            render_timeout: None,
        }
    }

    pub fn with_dwells(mut self, parsing: Duration, finishing: Duration) -> Self {
        self.parsing_dwell = parsing;
        self.finishing_dwell = finishing;
        self
    }

    pub fn with_success_reset(mut self, delay: Duration) -> Self {
        self.success_reset = delay;
        self
    }

    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    pub path: PathBuf,
    pub key: String,
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            path: PathBuf::from(".neogen/cache.json"),
            key: HISTORY_KEY.to_string(),
            capacity: HISTORY_CAPACITY,
        }
    }
}

impl HistoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = env::var("NEOGEN_HISTORY_PATH") {
            config.path = PathBuf::from(path);
        }
        config
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub api_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl BackendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_url = env::var("NEOGEN_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        BackendConfig { api_url }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub pipeline: PipelineConfig,
    pub history: HistoryConfig,
    pub backend: BackendConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Config {
            gemini: GeminiConfig::from_env(),
            pipeline: PipelineConfig::default(),
            history: HistoryConfig::from_env(),
            backend: BackendConfig::from_env(),
        }
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    pub fn with_pipeline(mut self, config: PipelineConfig) -> Self {
        self.pipeline = config;
        self
    }

    pub fn with_history(mut self, config: HistoryConfig) -> Self {
        self.history = config;
        self
    }

    pub fn with_backend(mut self, config: BackendConfig) -> Self {
        self.backend = config;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.gemini.model, "gemini-2.5-flash-image");
        assert_eq!(config.pipeline.parsing_dwell, Duration::from_millis(800));
        assert_eq!(config.pipeline.finishing_dwell, Duration::from_millis(600));
        assert_eq!(config.pipeline.success_reset, Duration::from_secs(2));
        assert_eq!(config.history.capacity, 10);
        assert_eq!(config.history.key, "prompt_history");
        assert_eq!(config.backend.api_url, "http://localhost:7860");
    }

    #[test]
    fn test_missing_api_key() {
        let config = GeminiConfig::new();
        assert!(matches!(
            config.require_api_key(),
            Err(StudioError::ConfigError(_))
        ));
        let config = config.with_api_key("test-key");
        assert_eq!(config.require_api_key().unwrap(), "test-key");
    }

    #[test]
    fn test_instant_pipeline() {
        let config = PipelineConfig::instant().with_render_timeout(Duration::from_secs(5));
        assert_eq!(config.parsing_dwell, Duration::ZERO);
        assert_eq!(config.render_timeout, Some(Duration::from_secs(5)));
    }
}
