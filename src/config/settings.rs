use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ai::{FallbackPolicy, ResponseParser};

/// Points at an alternate config file instead of `~/.outliner/config.toml`.
pub const CONFIG_ENV: &str = "OUTLINER_CONFIG";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    pub model: ModelConfig,
    pub parser: ParserConfig,
    pub history: HistoryConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ParserConfig {
    pub fallback_policy: FallbackPolicy,
    pub fallback_title: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub database_path: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub use_colors: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            let settings: Settings = toml::from_str(&content)
                .with_context(|| format!("Invalid config file {}", config_path.display()))?;
            Ok(settings)
        } else {
            // Return default settings if config doesn't exist
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        Ok(Self::app_dir()?.join("config.toml"))
    }

    pub fn app_dir() -> Result<PathBuf> {
        let home_dir =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;

        Ok(home_dir.join(".outliner"))
    }

    /// Database location with a leading `~` expanded.
    pub fn history_path(&self) -> Result<PathBuf> {
        expand_home(&self.history.database_path)
    }

    pub fn response_parser(&self) -> ResponseParser {
        ResponseParser::new(self.parser.fallback_policy, &self.parser.fallback_title)
    }
}

fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home_dir =
                dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
            Ok(home_dir.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string(),
            model: "qwen-plus".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            timeout_secs: 60,
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            fallback_policy: FallbackPolicy::TrailingSection,
            fallback_title: crate::ai::response::DEFAULT_FALLBACK_TITLE.to_string(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: "~/.outliner/history.db".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { use_colors: true }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}
