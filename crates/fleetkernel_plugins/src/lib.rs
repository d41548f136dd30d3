//! First-party feature plugins shipped with the rental host.
//!
//! Each plugin only talks to the kernel through `Core`: it registers menu
//! entries during `init` and binds actions whose tasks run against the
//! `FleetStore` on the worker thread.

pub mod fleet_status;
pub mod fuel_report;
pub mod rentals;

use fleetkernel_core::{KernelResult, PluginCatalog};

pub use fleet_status::FleetStatusPlugin;
pub use fuel_report::FuelReportPlugin;
pub use rentals::RentalPlugin;

/// Request field carrying the target vehicle id.
pub const FIELD_VEHICLE_ID: &str = "vehicle_id";

/// Discovery list of the built-in plugins, in initialization order.
pub fn builtin_catalog() -> KernelResult<PluginCatalog> {
    PluginCatalog::new()
        .with(Box::new(FleetStatusPlugin::new()))?
        .with(Box::new(RentalPlugin::new()))?
        .with(Box::new(FuelReportPlugin::new()))
}

#[cfg(test)]
mod tests {
    use super::builtin_catalog;
    use fleetkernel_core::Contribution;

    #[test]
    fn builtin_catalog_lists_plugins_in_order() {
        let catalog = builtin_catalog().expect("builtin catalog");
        assert_eq!(
            catalog.ids(),
            vec![
                "builtin.fleet.status".to_string(),
                "builtin.rentals".to_string(),
                "builtin.reports.fuel".to_string(),
            ]
        );
        let tab_plugins = catalog.list_by_contribution(Contribution::Tab);
        assert_eq!(tab_plugins.len(), 1);
        assert_eq!(tab_plugins[0].manifest().id, "builtin.reports.fuel");
    }
}
