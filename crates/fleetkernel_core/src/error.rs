//! Kernel error taxonomy.
//!
//! # Invariants
//! - `Validation` and `NotInitialized` are programmer errors: they are always
//!   returned to the caller and never turned into UI notifications.
//! - `Persistence` raised by an action is reported to the user at the handler
//!   boundary.
//! - `PluginInit` is recorded against the plugin and never aborts discovery.
//! - `ResourceNotFound` aborts only the feature that needed the resource.

use crate::extension::manifest::ManifestValidationError;
use crate::model::validation::ValidationError;
use crate::repo::vehicle_repo::RepoError;
use crate::resource::ResourceError;
use crate::ui::UiError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type KernelResult<T> = Result<T, KernelError>;

#[derive(Debug)]
pub enum KernelError {
    /// Invalid date range or malformed request/entity data.
    Validation(ValidationError),
    /// Data-layer fault on read or write.
    Persistence(RepoError),
    /// A plugin's `init` returned `false`, failed, or panicked.
    PluginInit { plugin_id: String, reason: String },
    /// Missing externally supplied report/query definition.
    ResourceNotFound(String),
    /// Report resource exists but could not be used.
    Resource(ResourceError),
    /// Registry accessed before bootstrap.
    NotInitialized,
    /// Bootstrap attempted twice.
    AlreadyInitialized,
    /// Plugin manifest failed declaration checks.
    InvalidManifest(ManifestValidationError),
    /// Two plugins share one id.
    DuplicatePlugin(String),
    /// A plugin registered an extension point kind it did not declare.
    ContributionDenied {
        plugin_id: String,
        contribution: &'static str,
    },
    /// Menu item has no bound action.
    UnknownAction(String),
    /// Toolkit facade rejected a handle.
    Ui(UiError),
    /// Work was abandoned before completion.
    Cancelled,
    /// Work exceeded the configured job timeout.
    TimedOut { elapsed_ms: u128 },
    /// Worker thread is gone or could not be started.
    WorkerUnavailable(String),
    /// Action task aborted abnormally.
    ActionFailed(String),
}

impl KernelError {
    /// Errors that indicate caller bugs rather than runtime faults.
    pub fn is_programmer_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotInitialized)
    }

    /// Stable short code used in log events and notifications.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Persistence(_) => "persistence",
            Self::PluginInit { .. } => "plugin_init",
            Self::ResourceNotFound(_) => "resource_not_found",
            Self::Resource(_) => "resource",
            Self::NotInitialized => "not_initialized",
            Self::AlreadyInitialized => "already_initialized",
            Self::InvalidManifest(_) => "invalid_manifest",
            Self::DuplicatePlugin(_) => "duplicate_plugin",
            Self::ContributionDenied { .. } => "contribution_denied",
            Self::UnknownAction(_) => "unknown_action",
            Self::Ui(_) => "ui",
            Self::Cancelled => "cancelled",
            Self::TimedOut { .. } => "timed_out",
            Self::WorkerUnavailable(_) => "worker_unavailable",
            Self::ActionFailed(_) => "action_failed",
        }
    }
}

impl Display for KernelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::Persistence(err) => write!(f, "persistence failure: {err}"),
            Self::PluginInit { plugin_id, reason } => {
                write!(f, "plugin `{plugin_id}` failed to initialize: {reason}")
            }
            Self::ResourceNotFound(path) => write!(f, "resource not found: {path}"),
            Self::Resource(err) => write!(f, "{err}"),
            Self::NotInitialized => write!(f, "core registry has not been bootstrapped"),
            Self::AlreadyInitialized => write!(f, "core registry is already bootstrapped"),
            Self::InvalidManifest(err) => write!(f, "invalid plugin manifest: {err}"),
            Self::DuplicatePlugin(id) => write!(f, "plugin id already registered: {id}"),
            Self::ContributionDenied {
                plugin_id,
                contribution,
            } => write!(
                f,
                "plugin `{plugin_id}` did not declare contribution `{contribution}`"
            ),
            Self::UnknownAction(value) => write!(f, "no action bound to {value}"),
            Self::Ui(err) => write!(f, "{err}"),
            Self::Cancelled => write!(f, "operation was cancelled"),
            Self::TimedOut { elapsed_ms } => {
                write!(f, "operation timed out after {elapsed_ms} ms")
            }
            Self::WorkerUnavailable(reason) => write!(f, "worker unavailable: {reason}"),
            Self::ActionFailed(reason) => write!(f, "action failed: {reason}"),
        }
    }
}

impl Error for KernelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::Resource(err) => Some(err),
            Self::InvalidManifest(err) => Some(err),
            Self::Ui(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for KernelError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for KernelError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Persistence(other),
        }
    }
}

impl From<ResourceError> for KernelError {
    fn from(value: ResourceError) -> Self {
        match value {
            ResourceError::NotFound(path) => Self::ResourceNotFound(path),
            other => Self::Resource(other),
        }
    }
}

impl From<ManifestValidationError> for KernelError {
    fn from(value: ManifestValidationError) -> Self {
        Self::InvalidManifest(value)
    }
}

impl From<UiError> for KernelError {
    fn from(value: UiError) -> Self {
        Self::Ui(value)
    }
}
