//! Vehicle availability actions.

use crate::FIELD_VEHICLE_ID;
use fleetkernel_core::{
    task, ActionBinding, Contribution, Content, Core, KernelResult, Plugin, PluginManifest,
    VehicleId, VehicleStatus,
};
use log::debug;

pub const PLUGIN_ID: &str = "builtin.fleet.status";
pub const MENU_GROUP: &str = "Fleet";
pub const RETURN_LABEL: &str = "Return vehicle";
pub const MAINTENANCE_LABEL: &str = "Send to maintenance";

/// Marks vehicles as returned (available) or under maintenance.
pub struct FleetStatusPlugin {
    manifest: PluginManifest,
}

impl FleetStatusPlugin {
    pub fn new() -> Self {
        Self {
            manifest: PluginManifest::new(
                PLUGIN_ID,
                env!("CARGO_PKG_VERSION"),
                &[Contribution::MenuItem, Contribution::Content],
            ),
        }
    }
}

impl Default for FleetStatusPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for FleetStatusPlugin {
    fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    fn init(&self, core: &Core) -> KernelResult<bool> {
        let ui = core.ui_controller()?;
        for (label, status) in [
            (RETURN_LABEL, VehicleStatus::Available),
            (MAINTENANCE_LABEL, VehicleStatus::Maintenance),
        ] {
            let handle = ui.add_menu_entry(MENU_GROUP, label)?;
            core.bind_action(handle, status_action(status))?;
        }
        Ok(true)
    }
}

fn status_action(status: VehicleStatus) -> ActionBinding {
    ActionBinding::primary_content(move |request| {
        let vehicle_id: VehicleId = request.parse(FIELD_VEHICLE_ID)?;
        debug!(
            "event=status_prepare module=plugins status=ok vehicle_id={vehicle_id} value={}",
            status.as_str()
        );
        Ok(task(move |store, token| {
            token.check()?;
            store.update_status(vehicle_id, status)?;
            Ok(Content::text(format!(
                "Vehicle {vehicle_id} is now {}.",
                status.as_str()
            )))
        }))
    })
}
