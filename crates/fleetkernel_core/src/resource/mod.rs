//! Externally supplied report definitions.
//!
//! # Responsibility
//! - Resolve a logical report path (e.g. `report1`) to query text.
//! - Let deployments override or add reports with `<dir>/<path>.sql` files.
//!
//! # Invariants
//! - Logical paths never escape the override directory.
//! - The override directory wins over built-in definitions.
//! - Missing definitions fail with `ResourceError::NotFound`; callers abort
//!   only the feature that needed the report.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Logical path of the fuel distribution report.
pub const FUEL_DISTRIBUTION_REPORT: &str = "report1";

static LOGICAL_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9_-]*(/[a-z0-9][a-z0-9_-]*)*$").expect("valid report path regex")
});

const BUILTIN_REPORTS: &[(&str, &str)] = &[(
    FUEL_DISTRIBUTION_REPORT,
    include_str!("reports/report1.sql"),
)];

/// Report resource lookup errors.
#[derive(Debug)]
pub enum ResourceError {
    InvalidPath(String),
    NotFound(String),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for ResourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath(value) => write!(f, "report path is invalid: {value}"),
            Self::NotFound(value) => write!(f, "report definition not found: {value}"),
            Self::Io { path, source } => {
                write!(f, "failed to read report `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ResourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Where a definition was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOrigin {
    BuiltIn,
    Directory,
}

/// Query text for one logical report path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDefinition {
    pub path: String,
    pub sql: String,
    pub origin: ReportOrigin,
}

/// Report definition lookup table.
#[derive(Debug, Clone, Default)]
pub struct ReportCatalog {
    override_dir: Option<PathBuf>,
}

impl ReportCatalog {
    /// Catalog serving only the built-in definitions.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Catalog that checks `dir` before the built-in definitions.
    pub fn with_directory(dir: impl Into<PathBuf>) -> Self {
        Self {
            override_dir: Some(dir.into()),
        }
    }

    pub fn override_dir(&self) -> Option<&Path> {
        self.override_dir.as_deref()
    }

    /// Loads the definition registered under `logical_path`.
    pub fn load(&self, logical_path: &str) -> Result<ReportDefinition, ResourceError> {
        let normalized = logical_path.trim();
        if !LOGICAL_PATH_RE.is_match(normalized) {
            return Err(ResourceError::InvalidPath(normalized.to_string()));
        }

        if let Some(dir) = self.override_dir.as_deref() {
            let file = dir.join(format!("{normalized}.sql"));
            match std::fs::read_to_string(&file) {
                Ok(sql) => {
                    debug!(
                        "event=report_load module=resource status=ok origin=directory path={normalized}"
                    );
                    return Ok(ReportDefinition {
                        path: normalized.to_string(),
                        sql,
                        origin: ReportOrigin::Directory,
                    });
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(ResourceError::Io { path: file, source }),
            }
        }

        BUILTIN_REPORTS
            .iter()
            .find(|(path, _)| *path == normalized)
            .map(|(path, sql)| ReportDefinition {
                path: (*path).to_string(),
                sql: (*sql).to_string(),
                origin: ReportOrigin::BuiltIn,
            })
            .ok_or_else(|| ResourceError::NotFound(normalized.to_string()))
    }
}
