//! Microkernel for the vehicle rental host.
//! Plugins contribute UI and behavior; this crate owns the registry, the
//! extension facade, the pricing rules and the persistence boundary.

pub mod config;
pub mod db;
pub mod error;
pub mod extension;
pub mod kernel;
pub mod logging;
pub mod model;
pub mod repo;
pub mod resource;
pub mod ui;

pub use config::{ConfigError, HostConfig};
pub use error::{KernelError, KernelResult};
pub use extension::catalog::PluginCatalog;
pub use extension::contribution::Contribution;
pub use extension::manifest::{ManifestValidationError, PluginManifest};
pub use extension::plugin::Plugin;
pub use kernel::cancel::CancellationToken;
pub use kernel::descriptor::{DiscoveryOptions, InitSummary, PluginDescriptor, PluginState};
pub use kernel::dispatch::{
    task, ActionBinding, ActionHandler, ActionRequest, ActionTarget, JobHandle, JobId,
    PumpSummary, Task, TaskResult,
};
pub use kernel::facade::UiFacade;
pub use kernel::worker::TaskWorker;
pub use kernel::{Core, DispatchSettings};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::rental::Rental;
pub use model::report::FuelReport;
pub use model::validation::ValidationError;
pub use model::vehicle::{Vehicle, VehicleDraft, VehicleId, VehicleStatus};
pub use model::vehicle_type::{vehicle_type_for_code, VehicleType};
pub use repo::fleet_store::{FleetStore, SqliteFleetStore};
pub use repo::vehicle_repo::{RepoError, RepoResult};
pub use resource::{ReportCatalog, ResourceError, FUEL_DISTRIBUTION_REPORT};
pub use ui::{Content, HeadlessUi, MenuItemHandle, Notification, TabHandle, UiController};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
