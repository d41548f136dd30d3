//! Host configuration.
//!
//! # Responsibility
//! - Load the JSON host configuration file.
//! - Turn it into the settings consumed by logging, storage, discovery and
//!   dispatch.
//!
//! # Invariants
//! - Every field has a default; an empty object is a valid configuration.
//! - Unknown fields are rejected instead of ignored.

use crate::kernel::descriptor::DiscoveryOptions;
use crate::kernel::DispatchSettings;
use crate::logging::{default_log_level, normalize_level};
use crate::resource::ReportCatalog;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// SQLite file; an in-memory store is used when unset.
    pub database_path: Option<PathBuf>,
    /// Directory of `<logical-path>.sql` report overrides.
    pub report_dir: Option<PathBuf>,
    /// Outstanding jobs older than this are cancelled.
    pub job_timeout_ms: Option<u64>,
    /// Plugin ids left uninitialized during discovery.
    pub disabled_plugins: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            database_path: None,
            report_dir: None,
            job_timeout_ms: None,
            disabled_plugins: Vec::new(),
        }
    }
}

impl HostConfig {
    /// Reads and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.log_level).map_err(ConfigError::InvalidLogLevel)?;
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir.clone()));
            }
        }
        if self.job_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroJobTimeout);
        }
        if let Some(id) = self.disabled_plugins.iter().find(|id| id.trim().is_empty()) {
            return Err(ConfigError::EmptyPluginId(id.clone()));
        }
        Ok(())
    }

    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            job_timeout: self.job_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn discovery_options(&self) -> DiscoveryOptions {
        self.disabled_plugins.iter().cloned().collect()
    }

    pub fn report_catalog(&self) -> ReportCatalog {
        match &self.report_dir {
            Some(dir) => ReportCatalog::with_directory(dir.clone()),
            None => ReportCatalog::builtin(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    InvalidLogLevel(String),
    RelativeLogDir(PathBuf),
    ZeroJobTimeout,
    EmptyPluginId(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::InvalidLogLevel(reason) => write!(f, "{reason}"),
            Self::RelativeLogDir(path) => {
                write!(f, "log_dir must be an absolute path, got `{}`", path.display())
            }
            Self::ZeroJobTimeout => write!(f, "job_timeout_ms must be greater than zero"),
            Self::EmptyPluginId(value) => {
                write!(f, "disabled_plugins contains an empty id: `{value}`")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}
