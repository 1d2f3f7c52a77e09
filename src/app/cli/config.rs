//! TOML configuration file parsing and loading
//!
//! Settings are layered: built-in defaults, then the configuration file, then
//! command-line flags. The file is either given explicitly (and must exist) or
//! discovered at `<config dir>/Licaudit/licaudit.toml`.

use crate::app::cli::args::Args;
use crate::core::error_handling::ContextualError;
use crate::core::logging::LogFormat;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("The specified configuration file does not exist: {path}")]
    NotFound { path: PathBuf },

    #[error("Error reading configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::Invalid { message } => Some(message),
            ConfigError::NotFound { .. } => Some("The specified configuration file does not exist"),
            ConfigError::Read { .. } => Some("Could not read the configuration file"),
            ConfigError::Parse { .. } => Some("The configuration file is not valid TOML for licaudit"),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub db_path: PathBuf,
    pub source_root: PathBuf,
    pub work_root: PathBuf,
    pub scancode_binary: String,
    pub extractcode_binary: String,
    pub skip_dirty_check: bool,
    pub skip_extract_archives: bool,
    pub wrap_in_global_transaction: bool,
    pub max_concurrency: Option<usize>,
    pub log_level: String,
    pub log_format: String,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("/data/db/db.sqlite"),
            source_root: PathBuf::from("/data/src"),
            work_root: PathBuf::from("/data/tmp"),
            scancode_binary: "scancode".to_string(),
            extractcode_binary: "extractcode".to_string(),
            skip_dirty_check: false,
            skip_extract_archives: false,
            wrap_in_global_transaction: true,
            max_concurrency: None,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            log_file: None,
        }
    }
}

/// Default config location, when the platform has a config directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("Licaudit").join("licaudit.toml"))
}

impl Settings {
    /// Defaults overlaid with the config file, if any
    pub async fn load(config_file: Option<&Path>) -> ConfigResult<Self> {
        let path = match config_file {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
        let settings = Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Overlay command-line flags
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(db_path) = &args.db_path {
            self.db_path = db_path.clone();
        }
        if let Some(source_root) = &args.source_root {
            self.source_root = source_root.clone();
        }
        if let Some(work_root) = &args.work_root {
            self.work_root = work_root.clone();
        }
        if let Some(log_level) = &args.log_level {
            self.log_level = log_level.clone();
        } else if args.debug {
            self.log_level = "debug".to_string();
        }
        if let Some(log_format) = &args.log_format {
            self.log_format = log_format.clone();
        }
        if let Some(log_file) = args.log_file_override() {
            self.log_file = log_file;
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        LogFormat::parse(&self.log_format).map_err(|message| ConfigError::Invalid { message })?;
        if self.max_concurrency == Some(0) {
            return Err(ConfigError::Invalid {
                message: "max_concurrency must be at least 1".to_string(),
            });
        }
        for (key, value) in [
            ("scancode_binary", &self.scancode_binary),
            ("extractcode_binary", &self.extractcode_binary),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    message: format!("{} must not be empty", key),
                });
            }
        }
        Ok(())
    }

    pub fn log_format(&self) -> LogFormat {
        LogFormat::parse(&self.log_format).unwrap_or_default()
    }
}
