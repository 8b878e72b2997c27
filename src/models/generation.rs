use crate::error::GenerationError;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "16:9")]
    Landscape16x9,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Portrait3x4,
        AspectRatio::Landscape4x3,
        AspectRatio::Portrait9x16,
        AspectRatio::Landscape16x9,
    ];

    /// Ratio string as sent to the provider, e.g. "16:9".
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Landscape16x9 => "16:9",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AspectRatio::Square => "Square (1:1)",
            AspectRatio::Portrait3x4 => "Portrait (3:4)",
            AspectRatio::Landscape4x3 => "Landscape (4:3)",
            AspectRatio::Portrait9x16 => "Story (9:16)",
            AspectRatio::Landscape16x9 => "Cinema (16:9)",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AspectRatio::ALL
            .iter()
            .copied()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| format!("unsupported aspect ratio: {}", s))
    }
}

/// The fixed catalogue of art styles offered by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArtStyle {
    #[default]
    None,
    Cyberpunk,
    Realistic,
    #[serde(rename = "Oil Painting")]
    OilPainting,
    Anime,
    #[serde(rename = "3D Render")]
    Render3d,
    Watercolor,
    Sketch,
    Synthwave,
}

impl ArtStyle {
    pub const ALL: [ArtStyle; 9] = [
        ArtStyle::None,
        ArtStyle::Cyberpunk,
        ArtStyle::Realistic,
        ArtStyle::OilPainting,
        ArtStyle::Anime,
        ArtStyle::Render3d,
        ArtStyle::Watercolor,
        ArtStyle::Sketch,
        ArtStyle::Synthwave,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtStyle::None => "None",
            ArtStyle::Cyberpunk => "Cyberpunk",
            ArtStyle::Realistic => "Realistic",
            ArtStyle::OilPainting => "Oil Painting",
            ArtStyle::Anime => "Anime",
            ArtStyle::Render3d => "3D Render",
            ArtStyle::Watercolor => "Watercolor",
            ArtStyle::Sketch => "Sketch",
            ArtStyle::Synthwave => "Synthwave",
        }
    }
}

impl fmt::Display for ArtStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ArtStyle::ALL
            .iter()
            .copied()
            .find(|style| style.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown art style: {}", s))
    }
}

/// What the user asked for. Validated on construction, consumed by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub style: ArtStyle,
    pub aspect_ratio: AspectRatio,
}

impl GenerationRequest {
    pub fn new(
        prompt: impl Into<String>,
        style: ArtStyle,
        aspect_ratio: AspectRatio,
    ) -> Result<Self, GenerationError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(GenerationError::Validation);
        }
        Ok(Self {
            prompt,
            style,
            aspect_ratio,
        })
    }

    /// The text actually sent to the provider.
    pub fn effective_prompt(&self) -> String {
        match self.style {
            ArtStyle::None => self.prompt.clone(),
            style => format!(
                "{}, in the style of {}, high quality, detailed",
                self.prompt, style
            ),
        }
    }
}

pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// A finished image. Handed to the caller exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub image_data: Vec<u8>,
    pub mime_type: String,
}

impl GenerationResult {
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.image_data)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    pub fn extension(&self) -> &'static str {
        extension_for_mime(&self.mime_type)
    }
}

pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_prompt_with_style() {
        let req = GenerationRequest::new("a cat", ArtStyle::Anime, AspectRatio::Square).unwrap();
        assert_eq!(
            req.effective_prompt(),
            "a cat, in the style of Anime, high quality, detailed"
        );
    }

    #[test]
    fn test_effective_prompt_without_style() {
        let req = GenerationRequest::new("a cat", ArtStyle::None, AspectRatio::Square).unwrap();
        assert_eq!(req.effective_prompt(), "a cat");
    }

    #[test]
    fn test_blank_prompt_rejected() {
        for prompt in ["", "   ", "\n\t"] {
            assert_eq!(
                GenerationRequest::new(prompt, ArtStyle::None, AspectRatio::Square),
                Err(GenerationError::Validation)
            );
        }
    }

    #[test]
    fn test_style_parsing() {
        assert_eq!("oil painting".parse::<ArtStyle>(), Ok(ArtStyle::OilPainting));
        assert_eq!("3D Render".parse::<ArtStyle>(), Ok(ArtStyle::Render3d));
        assert!("Baroque".parse::<ArtStyle>().is_err());
        assert_eq!(ArtStyle::default(), ArtStyle::None);
    }

    #[test]
    fn test_ratio_parsing_and_labels() {
        assert_eq!("9:16".parse::<AspectRatio>(), Ok(AspectRatio::Portrait9x16));
        assert!("21:9".parse::<AspectRatio>().is_err());
        assert_eq!(AspectRatio::Landscape16x9.label(), "Cinema (16:9)");
        assert_eq!(
            serde_json::to_string(&AspectRatio::Portrait3x4).unwrap(),
            "\"3:4\""
        );
    }

    #[test]
    fn test_data_url() {
        let result = GenerationResult {
            image_data: vec![1, 2, 3],
            mime_type: "image/jpeg".to_string(),
        };
        assert_eq!(result.to_data_url(), "data:image/jpeg;base64,AQID");
        assert_eq!(result.extension(), "jpg");
    }
}
