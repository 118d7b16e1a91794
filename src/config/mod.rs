//! Configuration management for scrivener
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Owner identifier stamped on every record this instance creates
    #[serde(default = "default_owner_id")]
    pub owner_id: String,

    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Embedding backend configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Structured extraction service configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Speech-to-text service configuration
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Transcript-fetch service configuration
    #[serde(default)]
    pub transcript: TranscriptConfig,

    /// Blob storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Purge job configuration
    #[serde(default)]
    pub purge: PurgeConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Target characters per chunk
    #[serde(default = "default_chunk_target_chars")]
    pub target_chars: usize,

    /// Hard maximum characters per chunk
    #[serde(default = "default_chunk_max_chars")]
    pub max_chars: usize,
}

/// Embedding backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding backend URL
    #[serde(default = "default_embedding_backend_url")]
    pub backend_url: String,

    /// Model name/identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension (must match model)
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Attempts per chunk before it is skipped
    #[serde(default = "default_embedding_max_attempts")]
    pub max_attempts: u32,

    /// Backoff unit in milliseconds, multiplied by the attempt number
    #[serde(default = "default_embedding_backoff_ms")]
    pub backoff_ms: u64,
}

/// Structured extraction service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Service base URL
    #[serde(default = "default_extraction_url")]
    pub base_url: String,

    /// Environment variable name for the API key
    #[serde(default = "default_extraction_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds
    #[serde(default = "default_extraction_timeout")]
    pub timeout_secs: u64,
}

/// Speech-to-text service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Service base URL
    #[serde(default = "default_speech_url")]
    pub base_url: String,

    /// Environment variable name for the API key
    #[serde(default = "default_speech_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds
    #[serde(default = "default_speech_timeout")]
    pub timeout_secs: u64,

    /// Interval between status polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum status polls before the run times out
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
}

/// Transcript-fetch service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Service base URL
    #[serde(default = "default_transcript_url")]
    pub base_url: String,

    /// Environment variable name for the API key
    #[serde(default = "default_transcript_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds
    #[serde(default = "default_transcript_timeout")]
    pub timeout_secs: u64,
}

/// Blob storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage base URL
    #[serde(default = "default_storage_url")]
    pub base_url: String,

    /// Bucket name
    #[serde(default = "default_storage_bucket")]
    pub bucket: String,

    /// Environment variable name for the API key
    #[serde(default = "default_storage_api_key_env")]
    pub api_key_env: String,

    /// Signed URL lifetime in seconds
    #[serde(default = "default_signed_url_ttl_secs")]
    pub signed_url_ttl_secs: u64,

    /// Request timeout in seconds
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,
}

/// Purge job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeConfig {
    /// Blob retention in days
    #[serde(default = "default_purge_retention_days")]
    pub retention_days: i64,

    /// Maximum objects listed per run
    #[serde(default = "default_purge_list_limit")]
    pub list_limit: usize,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for scrivener data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to SQLite database
    pub db_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner_id: default_owner_id(),
            chunk: ChunkConfig::default(),
            embedding: EmbeddingConfig::default(),
            extraction: ExtractionConfig::default(),
            speech: SpeechConfig::default(),
            transcript: TranscriptConfig::default(),
            storage: StorageConfig::default(),
            purge: PurgeConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            target_chars: default_chunk_target_chars(),
            max_chars: default_chunk_max_chars(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend_url: default_embedding_backend_url(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_embedding_timeout(),
            max_attempts: default_embedding_max_attempts(),
            backoff_ms: default_embedding_backoff_ms(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            base_url: default_extraction_url(),
            api_key_env: default_extraction_api_key_env(),
            timeout_secs: default_extraction_timeout(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: default_speech_url(),
            api_key_env: default_speech_api_key_env(),
            timeout_secs: default_speech_timeout(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            base_url: default_transcript_url(),
            api_key_env: default_transcript_api_key_env(),
            timeout_secs: default_transcript_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: default_storage_url(),
            bucket: default_storage_bucket(),
            api_key_env: default_storage_api_key_env(),
            signed_url_ttl_secs: default_signed_url_ttl_secs(),
            timeout_secs: default_storage_timeout(),
        }
    }
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            retention_days: default_purge_retention_days(),
            list_limit: default_purge_list_limit(),
        }
    }
}

impl Config {
    /// Get the default base directory for scrivener (~/.scrivener)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".scrivener")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            db_file: base.join("metadata.db"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            db_file: base.join("metadata.db"),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific base directory, falling back to
    /// defaults when no config file exists yet
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Get the extraction service API key from environment
    pub fn extraction_api_key(&self) -> Option<String> {
        std::env::var(&self.extraction.api_key_env).ok()
    }

    /// Get the speech service API key from environment
    pub fn speech_api_key(&self) -> Option<String> {
        std::env::var(&self.speech.api_key_env).ok()
    }

    /// Get the transcript service API key from environment
    pub fn transcript_api_key(&self) -> Option<String> {
        std::env::var(&self.transcript.api_key_env).ok()
    }

    /// Get the storage API key from environment
    pub fn storage_api_key(&self) -> Option<String> {
        std::env::var(&self.storage.api_key_env).ok()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.owner_id.trim().is_empty() {
            return Err(Error::Config("owner_id must not be empty".to_string()));
        }

        if self.chunk.target_chars == 0 {
            return Err(Error::Config(
                "chunk.target_chars must be positive".to_string(),
            ));
        }

        if self.chunk.max_chars < self.chunk.target_chars {
            return Err(Error::Config(
                "chunk.max_chars must be >= chunk.target_chars".to_string(),
            ));
        }

        if self.embedding.dimension == 0 {
            return Err(Error::Config(
                "embedding.dimension must be positive".to_string(),
            ));
        }

        if self.embedding.max_attempts == 0 {
            return Err(Error::Config(
                "embedding.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.speech.max_poll_attempts == 0 {
            return Err(Error::Config(
                "speech.max_poll_attempts must be at least 1".to_string(),
            ));
        }

        if self.purge.retention_days <= 0 {
            return Err(Error::Config(
                "purge.retention_days must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
