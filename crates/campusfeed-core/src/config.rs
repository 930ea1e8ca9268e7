use campusfeed_api::TableNames;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
///
/// Loaded from the config file, then overridden by env vars and CLI args.
/// Priority: CLI > Env > File > Defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub state: StateConfig,
}

impl Config {
    /// Load config from default location, falling back to defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Self::from_toml(&contents)
        } else {
            // No config file? Use defaults
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        toml::from_str(contents)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save config to disk
    pub fn save(&self) -> crate::Result<PathBuf> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the config file path
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("campusfeed");

        Ok(config_dir.join("config.toml"))
    }

    /// Where the read/dismissed database lives
    pub fn state_db_path(&self) -> crate::Result<PathBuf> {
        if let Some(ref path) = self.state.db_path {
            return Ok(path.clone());
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find data directory".into()))?
            .join("campusfeed");

        Ok(data_dir.join("state.db"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project URL of the hosted backend
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Anon/public API key for the project
    pub api_key: Option<String>,

    #[serde(default = "default_complaints_table")]
    pub complaints_table: String,

    #[serde(default = "default_lost_table")]
    pub lost_table: String,

    #[serde(default = "default_found_table")]
    pub found_table: String,
}

fn default_backend_url() -> String {
    "http://localhost:54321".to_string() // local dev stack
}

fn default_complaints_table() -> String {
    TableNames::default().complaints
}

fn default_lost_table() -> String {
    TableNames::default().lost_items
}

fn default_found_table() -> String {
    TableNames::default().found_items
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            api_key: None,
            complaints_table: default_complaints_table(),
            lost_table: default_lost_table(),
            found_table: default_found_table(),
        }
    }
}

impl BackendConfig {
    pub fn tables(&self) -> TableNames {
        TableNames {
            complaints: self.complaints_table.clone(),
            lost_items: self.lost_table.clone(),
            found_items: self.found_table.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between feed refreshes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    150
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        // A zero interval would make tokio's timer panic
        Duration::from_secs(self.interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StateConfig {
    /// Override for the state database location
    pub db_path: Option<PathBuf>,
}
