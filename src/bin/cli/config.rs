use super::{OutputFormat, Theme};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Settings read from `cli.toml`; every key is optional and command-line
/// flags take precedence.
#[derive(Debug, Default)]
pub struct CliConfig {
    path: Option<PathBuf>,
    data: RawConfig,
    format: Option<OutputFormat>,
    theme: Option<Theme>,
}

impl CliConfig {
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit.or_else(default_config_path);
        let data = match path.as_ref() {
            Some(config_path) if config_path.exists() => read_file(config_path)?,
            _ => RawConfig::default(),
        };
        let format = parse_enum(data.format.as_deref(), "format")?;
        let theme = parse_enum(data.theme.as_deref(), "theme")?;
        Ok(Self {
            path,
            data,
            format,
            theme,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn default_path(&self) -> Option<&PathBuf> {
        self.data.default_path.as_ref()
    }

    pub fn format(&self) -> Option<OutputFormat> {
        self.format
    }

    pub fn theme(&self) -> Option<Theme> {
        self.theme
    }

    pub fn log_level(&self) -> Option<&str> {
        self.data.log_level.as_deref()
    }

    pub fn max_depth(&self) -> Option<u32> {
        self.data.max_depth
    }

    pub fn raw_plists(&self) -> bool {
        self.data.raw_plists.unwrap_or(false)
    }
}

fn parse_enum<T: ValueEnum>(raw: Option<&str>, key: &'static str) -> Result<Option<T>, ConfigError> {
    raw.map(|value| {
        T::from_str(value, true).map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
    })
    .transpose()
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    default_path: Option<PathBuf>,
    format: Option<String>,
    theme: Option<String>,
    log_level: Option<String>,
    max_depth: Option<u32>,
    raw_plists: Option<bool>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read CLI config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse CLI config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config key '{key}' has invalid value '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("dsstore").join("cli.toml"))
}
