//! NeoGen - prompt-driven image generation with Gemini.
//!
//! A [`Studio`] session turns a prompt, an art style and an aspect ratio into
//! an image, moving through observable phases (Parsing, Rendering, Finishing)
//! so a front end can show progress. Successful prompts land in a bounded
//! history that survives restarts; generated images are kept in an
//! [`AssetRegistry`].
//!
//! ```no_run
//! use neogen::{ArtStyle, AspectRatio, Config, GenerationRequest, Studio};
//!
//! #[tokio::main]
//! async fn main() -> neogen::Result<()> {
//!     let studio = Studio::from_config(&Config::from_env())?;
//!     let request = GenerationRequest::new("a lighthouse at dusk", ArtStyle::Watercolor, AspectRatio::Landscape16x9)?;
//!     let project = studio.generate(request).await?;
//!     println!("{}", project.title);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod gemini;
pub mod history;
pub mod logger;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod settings;
pub mod status;
pub mod studio;

pub use config::{BackendConfig, Config, GeminiConfig, HistoryConfig, PipelineConfig};
pub use error::{classify_provider_error, GenerationError, Result, StudioError};
pub use gemini::{ContentPart, GeminiImageClient, ImageProvider, ProviderCall, ProviderError};
pub use history::{FileCache, LoadStatus, LocalCache, MemoryCache, PromptHistory};
pub use models::*;
pub use pipeline::GenerationPipeline;
pub use registry::AssetRegistry;
pub use settings::{ConfigBackend, SettingsClient, StorageSettings};
pub use studio::Studio;
