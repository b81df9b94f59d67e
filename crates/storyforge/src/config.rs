//! Layered configuration for the studio and the CLI.

use config::{Config, File, FileFormat};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use storyforge_error::{ConfigError, StoryforgeError, StoryforgeResult};
use storyforge_models::CorpusUrls;
use storyforge_storage::ArchiveConfig;
use tracing::debug;

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../storyforge.toml");

/// Image generation API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ImageApiConfig {
    /// Endpoint receiving the JSON request
    url: String,
    /// Output encoding requested from the server
    #[serde(default = "default_image_format")]
    image_format: String,
    /// Encoder quality hint
    #[serde(default = "default_image_quality")]
    image_quality: String,
    /// Ask the server to shrink output
    #[serde(default = "default_optimize_size")]
    optimize_size: bool,
    /// Upper bound on one image request
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

impl ImageApiConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_image_format() -> String {
    "webp".to_string()
}

fn default_image_quality() -> String {
    "85".to_string()
}

fn default_optimize_size() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    300
}

/// Chat-completion API used for scene enhancement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct LlmConfig {
    /// Chat completions endpoint
    url: String,
    /// Model used when the settings name none
    default_model: String,
    /// Environment variable holding the bearer key
    api_key_env: String,
}

/// Where documents are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Getters)]
pub struct StorageConfig {
    /// Document directory; the platform data directory when unset
    #[serde(default)]
    dir: Option<PathBuf>,
    /// Total bytes the store may hold
    #[serde(default)]
    quota_bytes: Option<u64>,
}

impl StorageConfig {
    /// Configured directory, else `{data_dir}/storyforge`.
    pub fn resolve_dir(&self) -> StoryforgeResult<PathBuf> {
        if let Some(dir) = &self.dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join("storyforge"))
            .ok_or_else(|| ConfigError::new("No platform data directory; set storage.dir").into())
    }
}

/// Per-generation defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct GenerationConfig {
    /// Exclusive upper bound for re-randomized seeds
    #[serde(default = "default_seed_max")]
    seed_max: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed_max: default_seed_max(),
        }
    }
}

fn default_seed_max() -> u64 {
    1_000_000
}

/// Complete studio configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct StudioConfig {
    /// Image API
    image_api: ImageApiConfig,
    /// Enhancement LLM
    llm: LlmConfig,
    /// Corpus download URLs
    corpus: CorpusUrls,
    /// History and trash limits
    #[serde(default)]
    archive: ArchiveConfig,
    /// Document store
    #[serde(default)]
    storage: StorageConfig,
    /// Generation defaults
    #[serde(default)]
    generation: GenerationConfig,
}

impl StudioConfig {
    /// Load configuration from a single file.
    pub fn from_file(path: impl AsRef<Path>) -> StoryforgeResult<Self> {
        debug!(path = %path.as_ref().display(), "Loading configuration from file");

        Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                StoryforgeError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                StoryforgeError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: current dir > home dir > bundled defaults.
    ///
    /// 1. Bundled defaults (`storyforge.toml` shipped with the crate)
    /// 2. `~/.config/storyforge/storyforge.toml`
    /// 3. `./storyforge.toml`
    ///
    /// Missing user files are skipped.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use storyforge::StudioConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = StudioConfig::load()?;
    /// println!("{}", config.image_api().url());
    /// # Ok(())
    /// # }
    /// ```
    pub fn load() -> StoryforgeResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/storyforge/storyforge.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("storyforge").required(false));

        builder
            .build()
            .map_err(|e| {
                StoryforgeError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                StoryforgeError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Bundled defaults only, ignoring user files.
    pub fn bundled() -> StoryforgeResult<Self> {
        Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| {
                StoryforgeError::from(ConfigError::new(format!(
                    "Failed to parse bundled configuration: {}",
                    e
                )))
            })
    }
}
