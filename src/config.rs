//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\seedmix\config.toml
//! - macOS: ~/Library/Application Support/seedmix/config.toml
//! - Linux: ~/.config/seedmix/config.toml
//!
//! The config file is human-readable and editable. Secrets can also come
//! from the environment, which takes precedence over the file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::RetryPolicy;
use crate::catalog::spotify::{DEFAULT_API_BASE, DEFAULT_AUTH_URL};

pub const ENV_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";
pub const ENV_TEXTGEN_API_KEY: &str = "OPENAI_API_KEY";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API credentials (keep separate for potential future encryption)
    pub credentials: Credentials,

    /// Catalog (Spotify Web API) client settings
    pub catalog: CatalogConfig,

    /// Optional text generation for AI recommendations and naming
    pub textgen: TextGenConfig,

    /// Playlist generation defaults
    pub generation: GenerationConfig,

    /// Local persistence
    pub storage: StorageConfig,
}

/// API credentials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Spotify app client id for the client-credentials flow
    pub spotify_client_id: Option<String>,

    pub spotify_client_secret: Option<String>,

    /// API key for the chat-completions endpoint
    pub textgen_api_key: Option<String>,
}

/// Catalog client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub api_base_url: String,
    pub auth_url: String,

    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,

    /// Retries for 5xx, 429 and connection errors (0 = never)
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            api_base_url: DEFAULT_API_BASE.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            request_timeout_secs: 10,
            max_retries: retry.max_retries,
            retry_base_delay_ms: retry.base_delay.as_millis() as u64,
            retry_max_delay_ms: retry.max_delay.as_millis() as u64,
        }
    }
}

impl CatalogConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms.max(self.retry_base_delay_ms)),
        }
    }
}

/// Text generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextGenConfig {
    /// Whether to use text generation at all (also needs an API key)
    pub enabled: bool,

    /// OpenAI-compatible base URL
    pub base_url: String,

    pub model: String,

    pub request_timeout_secs: u64,
}

impl Default for TextGenConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: crate::textgen::DEFAULT_BASE_URL.to_string(),
            model: crate::textgen::DEFAULT_MODEL.to_string(),
            request_timeout_secs: 20,
        }
    }
}

impl TextGenConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Playlist generation defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Tracks per playlist when a request gives no limit
    pub default_limit: usize,

    /// Overall deadline for the recommendation tiers before falling back
    /// to popular tracks
    pub deadline_secs: u64,

    /// Owner id used by the CLI
    pub owner_id: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_limit: crate::playlist::DEFAULT_LIMIT,
            deadline_secs: crate::recommend::DEFAULT_DEADLINE.as_secs(),
            owner_id: "local".to_string(),
        }
    }
}

impl GenerationConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs.max(1))
    }
}

/// Local persistence settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file (default: `seedmix.db` in the data directory)
    pub database_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Configured database path, else the OS data directory, else the
    /// current directory.
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("seedmix").join(crate::db::DEFAULT_DB_NAME))
                .unwrap_or_else(|| PathBuf::from(crate::db::DEFAULT_DB_NAME))
        })
    }
}

impl Config {
    /// Overlay secrets from the environment.
    ///
    /// `lookup` is `std::env::var(..).ok()` in production. Empty values are
    /// ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(id) = get(ENV_CLIENT_ID) {
            self.credentials.spotify_client_id = Some(id);
        }
        if let Some(secret) = get(ENV_CLIENT_SECRET) {
            self.credentials.spotify_client_secret = Some(secret);
        }
        if let Some(key) = get(ENV_TEXTGEN_API_KEY) {
            self.credentials.textgen_api_key = Some(key);
        }
    }

    /// Client id and secret, when both are configured.
    pub fn client_credentials(&self) -> Option<(&str, &str)> {
        match (
            self.credentials.spotify_client_id.as_deref(),
            self.credentials.spotify_client_secret.as_deref(),
        ) {
            (Some(id), Some(secret)) => Some((id, secret)),
            _ => None,
        }
    }

    /// API key for text generation, if it is enabled.
    pub fn textgen_api_key(&self) -> Option<&str> {
        if !self.textgen.enabled {
            return None;
        }
        self.credentials.textgen_api_key.as_deref()
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("seedmix"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from a specific file, with the same fallbacks as [`load`].
pub fn load_from(path: &std::path::Path) -> Config {
    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to disk
///
/// Creates the config directory if it doesn't exist.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &path)
}

/// Save configuration to a specific file, atomically.
pub fn save_to(config: &Config, path: &std::path::Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================
