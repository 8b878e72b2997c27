use clap::{Parser, Subcommand};
use neogen::{
    history::{FileCache, PromptHistory},
    logger::{self, LoggerConfig},
    registry::save_project,
    status, ArtStyle, AspectRatio, Config, GenerationRequest, SettingsClient, StorageSettings,
    Studio,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "neogen")]
#[command(about = "Generate images from prompts with Gemini and manage the studio history")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an image from a text prompt
    Generate {
        prompt: String,

        /// Art style, e.g. "Anime" or "Oil Painting"
        #[arg(short, long, default_value = "None")]
        style: ArtStyle,

        /// Aspect ratio: 1:1, 3:4, 4:3, 9:16 or 16:9
        #[arg(short, long, default_value = "1:1")]
        ratio: AspectRatio,

        /// Directory the image is written to
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Show recent prompts, newest first
    History,

    /// Regenerate a prompt from history by id
    Reuse {
        id: String,

        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// List available art styles and aspect ratios
    Styles,

    /// Backend storage settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current backend config
    Show,
    /// Flip auto-save to drive
    ToggleAutoSave,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let cli = Cli::parse();
    let logger_config = if cli.verbose {
        LoggerConfig::development()
    } else {
        LoggerConfig::from_env()
    };
    logger::init_with_config(logger_config)?;

    if dotenv_loaded {
        log::debug!("✅ .env file loaded");
    }

    let config = Config::from_env();
    if cli.verbose {
        logger::log_config_info(&config);
    }

    match cli.command {
        Commands::Generate {
            prompt,
            style,
            ratio,
            output,
        } => {
            let request = GenerationRequest::new(prompt, style, ratio)?;
            let studio = Studio::from_config(&config)?;
            run_generation(&studio, request, &output).await?;
        }
        Commands::History => {
            let history = open_history(&config);
            if history.is_empty() {
                println!("No history yet.");
            }
            for entry in history.list() {
                println!(
                    "{}  {}  [{} • {}]",
                    entry.id,
                    entry.prompt,
                    entry.style,
                    entry.ratio.label()
                );
            }
        }
        Commands::Reuse { id, output } => {
            let request = open_history(&config)
                .reuse(&id)
                .ok_or_else(|| format!("no history entry with id {}", id))?;
            let studio = Studio::from_config(&config)?;
            run_generation(&studio, request, &output).await?;
        }
        Commands::Styles => {
            println!("Styles:");
            for style in ArtStyle::ALL {
                println!("  {}", style);
            }
            println!("Aspect ratios:");
            for ratio in AspectRatio::ALL {
                println!("  {:<5} {}", ratio.as_str(), ratio.label());
            }
        }
        Commands::Settings { action } => {
            let settings = StorageSettings::new(SettingsClient::new(&config.backend));
            let current = settings.load().await;
            match action {
                SettingsAction::Show => {
                    println!("{}", serde_json::to_string_pretty(&current)?);
                }
                SettingsAction::ToggleAutoSave => {
                    let enabled = settings.toggle_auto_save().await?;
                    println!(
                        "Auto-save to drive: {}",
                        if enabled { "on" } else { "off" }
                    );
                }
            }
        }
    }

    Ok(())
}

fn open_history(config: &Config) -> PromptHistory {
    let cache = Arc::new(FileCache::new(config.history.path.clone()));
    PromptHistory::open(cache, &config.history)
}

async fn run_generation(
    studio: &Studio,
    request: GenerationRequest,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut phases = studio.subscribe();
    let printer = tokio::spawn(async move {
        while phases.changed().await.is_ok() {
            let view = status::project(*phases.borrow_and_update());
            if view.is_busy {
                println!("… {}", view.label);
            }
        }
    });

    let outcome = studio.generate(request).await;
    printer.abort();

    match outcome {
        Ok(project) => {
            std::fs::create_dir_all(output)?;
            let path = save_project(&project, output)?;
            println!("✅ {} -> {}", project.title, path.display());
            Ok(())
        }
        Err(e) => {
            log::error!("❌ Generation failed: {}", e);
            Err(e.into())
        }
    }
}
