use super::{ContentPart, ImageProvider, ProviderCall, ProviderError};
use crate::{
    config::GeminiConfig,
    error::{Result, StudioError},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SAFETY_FINISH_REASONS: [&str; 4] = [
    "SAFETY",
    "IMAGE_SAFETY",
    "IMAGE_PROHIBITED_CONTENT",
    "PROHIBITED_CONTENT",
];

/// Stops that are not safety blocks and surface with their raw reason.
const OTHER_BLOCK_REASONS: [&str; 3] = ["RECITATION", "IMAGE_RECITATION", "BLOCKLIST"];

#[derive(Clone)]
pub struct GeminiImageClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiImageClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| StudioError::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl ImageProvider for GeminiImageClient {
    async fn generate_content(
        &self,
        call: ProviderCall,
    ) -> std::result::Result<Vec<ContentPart>, ProviderError> {
        let body = GenerateContentRequest::new(&call);

        log::info!(
            "Generating image with model: {} ({})",
            call.model,
            call.aspect_ratio
        );
        log::debug!("Gemini prompt: {}", call.prompt);

        let response = self
            .client
            .post(self.endpoint(&call.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::new(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::new(format!(
                "[{}] {}",
                status.as_u16(),
                text.trim()
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::new(format!("Invalid Gemini response: {}", e)))?;

        parsed.into_parts()
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
    image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: &'static str,
}

impl GenerateContentRequest {
    fn new(call: &ProviderCall) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: call.prompt.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE"],
                image_config: ImageConfig {
                    aspect_ratio: call.aspect_ratio.as_str(),
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

impl GenerateContentResponse {
    /// Parts of the first candidate. Blocks come back as HTTP 200 and are
    /// turned into errors whose message carries "SAFETY".
    fn into_parts(self) -> std::result::Result<Vec<ContentPart>, ProviderError> {
        if let Some(feedback) = self.prompt_feedback {
            if let Some(reason) = feedback.block_reason {
                let detail = feedback
                    .block_reason_message
                    .unwrap_or_else(|| "prompt blocked".to_string());
                return Err(ProviderError::new(format!(
                    "SAFETY: {} ({})",
                    detail, reason
                )));
            }
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Ok(Vec::new());
        };

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if SAFETY_FINISH_REASONS.contains(&reason) {
                return Err(ProviderError::new(format!(
                    "SAFETY: generation stopped ({})",
                    reason
                )));
            }
            if OTHER_BLOCK_REASONS.contains(&reason) {
                return Err(ProviderError::new(format!(
                    "Generation stopped by the model: {}",
                    reason
                )));
            }
        }

        Ok(candidate.content.map(|c| c.parts).unwrap_or_default())
    }
}
