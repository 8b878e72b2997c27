use thiserror::Error;

/// Failure of a single generation submission.
///
/// The `Display` text is what the studio shows to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("Prompt must not be empty")]
    Validation,
    #[error("A generation is already in progress")]
    AlreadyInProgress,
    #[error("Service is busy (Rate Limit). Please try again later.")]
    RateLimited,
    #[error("The request was invalid. Try a simpler prompt.")]
    InvalidRequest,
    #[error("Generation blocked by safety settings.")]
    SafetyBlocked,
    #[error("No image data found in response")]
    NoImageData,
    #[error("{}", unknown_message(.0))]
    Unknown(String),
}

fn unknown_message(raw: &str) -> &str {
    if raw.trim().is_empty() {
        "Failed to generate image."
    } else {
        raw
    }
}

impl GenerationError {
    /// Errors that came back from the provider. Those end the submission in
    /// the Error phase; validation and single-flight rejections never leave Idle.
    pub fn is_provider_failure(&self) -> bool {
        !matches!(self, Self::Validation | Self::AlreadyInProgress)
    }
}

/// Maps a provider error message to a [`GenerationError`].
///
/// Order matters: a message carrying both "429" and "SAFETY" is a rate limit.
pub fn classify_provider_error(message: &str) -> GenerationError {
    if message.contains("429") {
        GenerationError::RateLimited
    } else if message.contains("400") {
        GenerationError::InvalidRequest
    } else if message.contains("SAFETY") {
        GenerationError::SafetyBlocked
    } else {
        GenerationError::Unknown(message.to_string())
    }
}

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl From<reqwest::Error> for StudioError {
    fn from(e: reqwest::Error) -> Self {
        StudioError::RequestError(e.to_string())
    }
}

impl From<serde_json::Error> for StudioError {
    fn from(e: serde_json::Error) -> Self {
        StudioError::SerializationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_priority() {
        assert_eq!(
            classify_provider_error("HTTP 429: quota exceeded"),
            GenerationError::RateLimited
        );
        assert_eq!(
            classify_provider_error("HTTP 400: bad aspect ratio"),
            GenerationError::InvalidRequest
        );
        assert_eq!(
            classify_provider_error("finishReason SAFETY"),
            GenerationError::SafetyBlocked
        );
        // 429 wins over 400 and SAFETY
        assert_eq!(
            classify_provider_error("429 400 SAFETY"),
            GenerationError::RateLimited
        );
        assert_eq!(
            classify_provider_error("400 SAFETY"),
            GenerationError::InvalidRequest
        );
    }

    #[test]
    fn test_unknown_keeps_original_text() {
        let err = classify_provider_error("connection reset by peer");
        assert_eq!(
            err,
            GenerationError::Unknown("connection reset by peer".to_string())
        );
        assert_eq!(err.to_string(), "connection reset by peer");
    }

    #[test]
    fn test_safety_match_is_case_sensitive() {
        assert_eq!(
            classify_provider_error("blocked for safety"),
            GenerationError::Unknown("blocked for safety".to_string())
        );
    }

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            GenerationError::RateLimited.to_string(),
            "Service is busy (Rate Limit). Please try again later."
        );
        assert_eq!(
            GenerationError::SafetyBlocked.to_string(),
            "Generation blocked by safety settings."
        );
        assert_eq!(
            GenerationError::Unknown(String::new()).to_string(),
            "Failed to generate image."
        );
    }

    #[test]
    fn test_studio_error_wraps_generation() {
        let err: StudioError = GenerationError::NoImageData.into();
        assert_eq!(err.to_string(), "No image data found in response");
        assert!(matches!(
            err,
            StudioError::Generation(GenerationError::NoImageData)
        ));
    }

    #[test]
    fn test_provider_failure_flag() {
        assert!(!GenerationError::Validation.is_provider_failure());
        assert!(!GenerationError::AlreadyInProgress.is_provider_failure());
        assert!(GenerationError::NoImageData.is_provider_failure());
    }
}
