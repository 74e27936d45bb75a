use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL_BASE_URL, DEFAULT_TEMPERATURE, SEARCH_TOP_K,
};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Session storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Generation model configuration
    #[serde(default)]
    pub model: ModelSettings,

    /// Web search configuration
    #[serde(default)]
    pub search: SearchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            model: ModelSettings::default(),
            search: SearchConfig::default(),
        }
    }
}

/// Session storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for session documents (defaults to the platform data dir)
    pub root: Option<PathBuf>,
    /// Keep the conversation name when history is cleared
    pub keep_name_on_clear: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: None,
            keep_name_on_clear: true,
        }
    }
}

/// Generation model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Base URL of an OpenAI-compatible chat completions endpoint
    pub base_url: String,
    /// Model name passed through to the endpoint
    pub name: String,
    /// Environment variable containing the API key
    pub api_key_env: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: usize,
    /// System prompt override
    pub system_prompt: Option<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MODEL_BASE_URL.to_string(),
            name: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: None,
        }
    }
}

/// Web search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Environment variable containing the Tavily API key
    pub tavily_api_key_env: String,
    /// Maximum results to request from a provider
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tavily_api_key_env: "TAVILY_API_KEY".to_string(),
            max_results: SEARCH_TOP_K,
        }
    }
}

/// Load configuration from multiple sources
pub fn load_config() -> Result<Config> {
    // Get config directories
    let config_dir = get_config_dir()?;
    let global_config = config_dir.join("config.toml");
    let local_config = PathBuf::from(".selkie/config.toml");

    // Build figment configuration
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    // Add global config if it exists
    if global_config.exists() {
        figment = figment.merge(Toml::file(&global_config));
    }

    // Add local config if it exists
    if local_config.exists() {
        figment = figment.merge(Toml::file(&local_config));
    }

    // Add environment variables (SELKIE_ prefix)
    figment = figment.merge(Env::prefixed("SELKIE_"));

    // Extract and return config
    figment.extract().context("Failed to load configuration")
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "selkie") {
        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;
        Ok(config_dir.to_path_buf())
    } else {
        // Fallback to home directory
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        let config_dir = PathBuf::from(home).join(".config").join("selkie");
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = if let Some(p) = path {
        p
    } else {
        get_config_dir()?.join("config.toml")
    };

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist
pub fn init_config() -> Result<()> {
    let config_dir = get_config_dir()?;
    let config_file = config_dir.join("config.toml");

    if !config_file.exists() {
        let default_config = Config::default();
        save_config(&default_config, Some(config_file.clone()))?;
        println!("Created default configuration at: {}", config_file.display());
    }

    Ok(())
}
