//! Rental booking: prices a rental and confirms it against the fleet store.

use crate::FIELD_VEHICLE_ID;
use fleetkernel_core::{
    task, vehicle_type_for_code, ActionBinding, ActionRequest, Contribution, Content, Core,
    KernelResult, Plugin, PluginManifest, Rental, Task, ValidationError, VehicleId,
};
use log::debug;

pub const PLUGIN_ID: &str = "builtin.rentals";
pub const MENU_GROUP: &str = "Rentals";
pub const CONFIRM_LABEL: &str = "Confirm rental";

pub const FIELD_VEHICLE_TYPE: &str = "vehicle_type";
pub const FIELD_BASE_RATE: &str = "base_rate";
pub const FIELD_INSURANCE_FEE: &str = "insurance_fee";
pub const FIELD_START_DATE: &str = "start_date";
pub const FIELD_END_DATE: &str = "end_date";
pub const FIELD_PICKUP_LOCATION: &str = "pickup_location";

pub struct RentalPlugin {
    manifest: PluginManifest,
}

impl RentalPlugin {
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

impl Default for RentalPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for RentalPlugin {
    fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    fn init(&self, core: &Core) -> KernelResult<bool> {
        let ui = core.ui_controller()?;
        let handle = ui.add_menu_entry(MENU_GROUP, CONFIRM_LABEL)?;
        core.bind_action(handle, ActionBinding::primary_content(prepare_confirmation))?;
        Ok(true)
    }
}

/// Builds the rental described by `request`.
///
/// The returned rental has already passed date-range and amount validation.
pub fn rental_from_request(request: &ActionRequest) -> Result<Rental, ValidationError> {
    let vehicle_id: VehicleId = request.parse(FIELD_VEHICLE_ID)?;
    let code = request.require(FIELD_VEHICLE_TYPE)?;
    let vehicle_type = vehicle_type_for_code(code)
        .ok_or_else(|| ValidationError::UnknownVehicleType(code.to_string()))?;

    let rental = Rental::new(
        vehicle_id,
        vehicle_type,
        request.parse(FIELD_BASE_RATE)?,
        request.parse(FIELD_INSURANCE_FEE)?,
        request.parse_date(FIELD_START_DATE)?,
        request.parse_date(FIELD_END_DATE)?,
        request.get(FIELD_PICKUP_LOCATION).unwrap_or_default().trim(),
    );
    rental.validate()?;
    Ok(rental)
}

fn prepare_confirmation(request: &ActionRequest) -> KernelResult<Task> {
    let rental = rental_from_request(request)?;
    let total = rental.calculate_total()?;
    let days = rental.rental_days()?;
    debug!(
        "event=rental_prepare module=plugins status=ok vehicle_id={} days={days}",
        rental.vehicle_id()
    );

    Ok(task(move |store, token| {
        token.check()?;
        let rental_id = store.confirm_rental(&rental)?;
        Ok(Content::text(format!(
            "Rental #{rental_id} confirmed for vehicle {}: {days} day(s) from {} to {}, total {total:.2}.",
            rental.vehicle_id(),
            rental.start_date(),
            rental.end_date(),
        )))
    }))
}

#[cfg(test)]
mod tests {
    use super::{rental_from_request, FIELD_END_DATE};
    use fleetkernel_core::{ActionRequest, ValidationError};

    fn request() -> ActionRequest {
        [
            ("vehicle_id", "1"),
            ("vehicle_type", "economy"),
            ("base_rate", "50"),
            ("insurance_fee", "10"),
            ("start_date", "2024-01-01"),
            ("end_date", "2024-01-03"),
            ("pickup_location", "Airport"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn builds_and_prices_rental() {
        let rental = rental_from_request(&request()).expect("valid request");
        assert_eq!(rental.rental_days(), Ok(3));
        assert_eq!(rental.calculate_total(), Ok(160.0));
        assert_eq!(rental.pickup_location(), "Airport");
    }

    #[test]
    fn rejects_unknown_vehicle_type() {
        let request = request().with("vehicle_type", "hovercraft");
        assert_eq!(
            rental_from_request(&request).err(),
            Some(ValidationError::UnknownVehicleType("hovercraft".to_string()))
        );
    }

    #[test]
    fn rejects_inverted_range() {
        let request = request().with(FIELD_END_DATE, "2023-12-31");
        assert!(matches!(
            rental_from_request(&request),
            Err(ValidationError::EndBeforeStart { .. })
        ));
    }
}
