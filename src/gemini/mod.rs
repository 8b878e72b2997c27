pub mod image_client;

use crate::models::AspectRatio;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use image_client::GeminiImageClient;

/// Everything the provider needs for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCall {
    pub model: String,
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
}

/// A provider failure. Only the message is meaningful; it is classified by
/// [`crate::error::classify_provider_error`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Base64 payload as returned on the wire.
    #[serde(default)]
    pub data: String,
}

/// One part of a provider response. Text parts are kept but ignored by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub inline_data: Option<InlineData>,
}

impl ContentPart {
    pub fn image(mime_type: Option<&str>, base64_data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.map(String::from),
                data: base64_data.into(),
            }),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }
}

/// The remote image model. One call per submission attempt, no retries.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate_content(
        &self,
        call: ProviderCall,
    ) -> std::result::Result<Vec<ContentPart>, ProviderError>;

    fn name(&self) -> &str;
}
