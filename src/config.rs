use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub images: ImagesConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub rest_api: RestApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which image provider backs the illustration step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageProviderKind {
    /// Remote image-generation endpoint (OpenAI images API)
    #[default]
    Openai,
    /// Local SVG placeholders, no network
    Placeholder,
}

impl ImageProviderKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ImageProviderKind::Openai => "OpenAI images",
            ImageProviderKind::Placeholder => "SVG placeholders",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    #[serde(default)]
    pub provider: ImageProviderKind,
    /// Base URL of the image service, without the `/v1/images/generations` path
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_size")]
    pub size: String,
    #[serde(default = "default_quality")]
    pub quality: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-image-1".to_string()
}

fn default_size() -> String {
    "1024x768".to_string()
}

fn default_quality() -> String {
    "high".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_user_agent() -> String {
    format!("fiabe/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            provider: ImageProviderKind::default(),
            base_url: default_base_url(),
            model: default_model(),
            size: default_size(),
            quality: default_quality(),
            api_key_env: default_api_key_env(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the persisted wizard session
    pub state: String,
}

/// REST API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestApiConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allow any origin (the wizard front-end is usually served elsewhere)
    #[serde(default = "default_cors")]
    pub cors: bool,
}

fn default_port() -> u16 {
    7010
}

fn default_cors() -> bool {
    true
}

impl Default for RestApiConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            cors: default_cors(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write logs to `<state>/logs/` instead of stderr
    #[serde(default)]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: false,
        }
    }
}

impl Config {
    /// Path to the project-local config file
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(".fiabe/config.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so fiabe works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let local_config = Self::local_config_path();
        if local_config.exists() {
            builder = builder.add_source(config::File::from(local_config));
        }

        // User config in ~/.config/fiabe/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("fiabe").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables with FIABE_ prefix, e.g. FIABE_IMAGES__PROVIDER
        builder = builder.add_source(
            config::Environment::with_prefix("FIABE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }

    /// Get absolute path to the session state directory
    pub fn state_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.paths.state);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            images: ImagesConfig::default(),
            paths: PathsConfig {
                state: ".fiabe".to_string(),
            },
            rest_api: RestApiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
