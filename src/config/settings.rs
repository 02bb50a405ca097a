//! Configuration settings management
//!
//! Defaults are overridden by the configuration file, then by environment
//! variables, then by command-line flags.

use crate::error::{BlobscoutError, Result};
use crate::utils::format::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    /// Upper bound on storage calls in flight
    pub max_concurrency: usize,
    pub output_format: OutputFormat,
    /// Default dump file for --store-content
    pub content_file: PathBuf,
    pub sort_output: bool,
    pub no_color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            max_concurrency: 16,
            output_format: OutputFormat::Tree,
            content_file: PathBuf::from("blobcontent.txt"),
            sort_output: true,
            no_color: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(BlobscoutError::config("max_concurrency must be at least 1"));
        }

        if self.content_file.as_os_str().is_empty() {
            return Err(BlobscoutError::config("content_file cannot be empty"));
        }

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        // XDG on Linux and macOS, platform config directory elsewhere
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            use std::env;
            let config_dir = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
                PathBuf::from(xdg_config_home)
            } else {
                let home_dir = env::var("HOME")
                    .map_err(|_| BlobscoutError::config("HOME environment variable not set"))?;
                PathBuf::from(home_dir).join(".config")
            };
            Ok(config_dir.join("blobscout").join("blobscout.toml"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let config_dir = dirs::config_dir()
                .ok_or_else(|| BlobscoutError::config("Unable to determine config directory"))?;
            Ok(config_dir.join("blobscout").join("blobscout.toml"))
        }
    }
}

/// Load configuration from the default path and the environment, then validate
pub async fn load_config() -> Result<Config> {
    let config_path = Config::get_config_path()?;
    load_config_from(&config_path).await
}

/// Load configuration from `path` (if it exists) and the environment
pub async fn load_config_from(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        load_from_file(path).await?
    } else {
        Config::default()
    };

    load_from_env(&mut config);
    config.validate()?;

    Ok(config)
}

async fn load_from_file(path: &Path) -> Result<Config> {
    let contents = tokio::fs::read_to_string(path).await?;

    // Try to parse as TOML first, then JSON as fallback
    if let Ok(config) = toml::from_str::<Config>(&contents) {
        return Ok(config);
    }

    serde_json::from_str::<Config>(&contents).map_err(|e| {
        BlobscoutError::config(format!(
            "Failed to parse configuration file {}: {}",
            path.display(),
            e
        ))
    })
}

fn load_from_env(config: &mut Config) {
    if let Ok(value) = std::env::var("DEBUG") {
        config.debug = parse_bool(&value);
    }

    if let Ok(value) = std::env::var("BLOBSCOUT_MAX_CONCURRENCY") {
        if let Ok(workers) = value.parse::<usize>() {
            config.max_concurrency = workers;
        }
    }

    if let Ok(value) = std::env::var("BLOBSCOUT_FORMAT") {
        if let Ok(format) = value.parse::<OutputFormat>() {
            config.output_format = format;
        }
    }

    if let Ok(value) = std::env::var("BLOBSCOUT_CONTENT_FILE") {
        config.content_file = PathBuf::from(value);
    }

    if let Ok(value) = std::env::var("BLOBSCOUT_SORT_OUTPUT") {
        config.sort_output = parse_bool(&value);
    }

    if std::env::var("NO_COLOR").is_ok() {
        config.no_color = true;
    }

    if let Ok(value) = std::env::var("BLOBSCOUT_NO_COLOR") {
        config.no_color = parse_bool(&value);
    }
}

fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
