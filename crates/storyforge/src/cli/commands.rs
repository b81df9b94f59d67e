//! CLI command definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use storyforge::ImageSize;
use uuid::Uuid;

/// Storyforge - character and scene driven image generation
#[derive(Parser, Debug)]
#[command(name = "storyforge")]
#[command(about = "Generate character images scene by scene, with history and trash", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file used instead of the default search path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate one image per scene
    Generate(GenerateArgs),

    /// Generation history
    #[command(subcommand)]
    History(HistoryCommands),

    /// Deleted images
    #[command(subcommand)]
    Trash(TrashCommands),

    /// Export a generation from history
    Export {
        /// Generation id
        generation: Uuid,

        /// Export only this image instead of zipping the batch
        #[arg(long)]
        image: Option<Uuid>,

        /// Destination directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

/// Prompt and setting flags for `generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Character name
    #[arg(long)]
    pub name: String,

    /// Base appearance description
    #[arg(long, default_value = "")]
    pub base: String,

    /// Clothing description
    #[arg(long, default_value = "")]
    pub clothing: String,

    /// Character details repeated in every scene
    #[arg(long, default_value = "")]
    pub scene_details: String,

    /// Background description
    #[arg(long, default_value = "")]
    pub background: String,

    /// Quality tags appended to every scene
    #[arg(long)]
    pub quality: Option<String>,

    /// Negative prompt
    #[arg(long)]
    pub negative: Option<String>,

    /// Extra instructions for scene enhancement
    #[arg(long, default_value = "")]
    pub arguments: String,

    /// Organization style preset
    #[arg(long, default_value = "Realistic")]
    pub style: String,

    /// Image size (1344x768, 768x1344 or 836x1216)
    #[arg(long, default_value = "1344x768")]
    pub size: ImageSize,

    /// Batch seed; random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Lines drawn from the solo corpus
    #[arg(long, default_value = "30")]
    pub start: u32,

    /// Lines drawn from the couple corpus
    #[arg(long, default_value = "60")]
    pub mid: u32,

    /// Lines drawn from the detail corpus
    #[arg(long, default_value = "90")]
    pub end: u32,

    /// LLM model used for scene enhancement
    #[arg(long)]
    pub model: Option<String>,

    /// Lora reference (`modelId@versionId`)
    #[arg(long)]
    pub lora: Option<String>,

    /// Use the sampled scenes without LLM enhancement
    #[arg(long)]
    pub no_enhance: bool,

    /// Zip the batch into this directory
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// History subcommands
#[derive(Subcommand, Debug)]
pub enum HistoryCommands {
    /// List saved generations, newest first
    List {
        /// Case-insensitive filter on name, style, base and background
        #[arg(long)]
        search: Option<String>,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Delete a generation, moving its images to trash
    Delete {
        /// Generation id
        id: Uuid,
    },
}

/// Trash subcommands
#[derive(Subcommand, Debug)]
pub enum TrashCommands {
    /// List deleted images, newest first
    List {
        /// Case-insensitive filter on name, style, base and background
        #[arg(long)]
        search: Option<String>,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Take images out of trash and write them to a directory
    Restore {
        /// Image ids
        #[arg(required = true)]
        ids: Vec<Uuid>,

        /// Destination directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Permanently delete images
    Delete {
        /// Image ids
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },

    /// Permanently delete everything in trash
    Clear,
}

/// Output format for list commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
