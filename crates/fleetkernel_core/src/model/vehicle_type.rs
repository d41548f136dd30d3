//! Vehicle type fee schedules.
//!
//! Each variant owns one pure `additional_fees(days)` schedule. The amounts are
//! policy data; `Rental::calculate_total` only relies on the trait.

use once_cell::sync::Lazy;
use std::fmt::Debug;
use std::sync::Arc;

/// Manifest/storage code for the economy schedule.
pub const VEHICLE_TYPE_ECONOMY: &str = "economy";
/// Manifest/storage code for the compact schedule.
pub const VEHICLE_TYPE_COMPACT: &str = "compact";
/// Manifest/storage code for the SUV schedule.
pub const VEHICLE_TYPE_SUV: &str = "suv";
/// Manifest/storage code for the luxury schedule.
pub const VEHICLE_TYPE_LUXURY: &str = "luxury";

const COMPACT_FLAT_SURCHARGE: f64 = 15.0;
const SUV_DAILY_SURCHARGE: f64 = 12.0;
const LUXURY_DAILY_SURCHARGE: f64 = 40.0;
const LUXURY_LONG_RENTAL_DAILY_SURCHARGE: f64 = 30.0;
const LUXURY_LONG_RENTAL_THRESHOLD_DAYS: u32 = 7;

/// Fee schedule capability attached to every rental.
pub trait VehicleType: Debug + Send + Sync {
    /// Stable code persisted with rentals.
    fn code(&self) -> &'static str;
    /// Surcharge for a rental lasting `days` (inclusive day count, `>= 1`).
    fn additional_fees(&self, days: u32) -> f64;
}

/// No surcharge.
#[derive(Debug, Clone, Copy, Default)]
pub struct Economy;

/// One flat surcharge per rental.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compact;

/// Surcharge charged for every rental day.
#[derive(Debug, Clone, Copy, Default)]
pub struct Suv;

/// Per-day surcharge; days past the first week use a discounted rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Luxury;

impl VehicleType for Economy {
    fn code(&self) -> &'static str {
        VEHICLE_TYPE_ECONOMY
    }

    fn additional_fees(&self, _days: u32) -> f64 {
        0.0
    }
}

impl VehicleType for Compact {
    fn code(&self) -> &'static str {
        VEHICLE_TYPE_COMPACT
    }

    fn additional_fees(&self, _days: u32) -> f64 {
        COMPACT_FLAT_SURCHARGE
    }
}

impl VehicleType for Suv {
    fn code(&self) -> &'static str {
        VEHICLE_TYPE_SUV
    }

    fn additional_fees(&self, days: u32) -> f64 {
        SUV_DAILY_SURCHARGE * f64::from(days)
    }
}

impl VehicleType for Luxury {
    fn code(&self) -> &'static str {
        VEHICLE_TYPE_LUXURY
    }

    fn additional_fees(&self, days: u32) -> f64 {
        let full_rate_days = days.min(LUXURY_LONG_RENTAL_THRESHOLD_DAYS);
        let discounted_days = days.saturating_sub(LUXURY_LONG_RENTAL_THRESHOLD_DAYS);
        LUXURY_DAILY_SURCHARGE * f64::from(full_rate_days)
            + LUXURY_LONG_RENTAL_DAILY_SURCHARGE * f64::from(discounted_days)
    }
}

const SUPPORTED_VEHICLE_TYPES: &[&str] = &[
    VEHICLE_TYPE_ECONOMY,
    VEHICLE_TYPE_COMPACT,
    VEHICLE_TYPE_SUV,
    VEHICLE_TYPE_LUXURY,
];

/// Returns every known vehicle type code.
pub fn supported_vehicle_types() -> &'static [&'static str] {
    SUPPORTED_VEHICLE_TYPES
}

static ECONOMY: Lazy<Arc<dyn VehicleType>> = Lazy::new(|| Arc::new(Economy));
static COMPACT: Lazy<Arc<dyn VehicleType>> = Lazy::new(|| Arc::new(Compact));
static SUV: Lazy<Arc<dyn VehicleType>> = Lazy::new(|| Arc::new(Suv));
static LUXURY: Lazy<Arc<dyn VehicleType>> = Lazy::new(|| Arc::new(Luxury));

/// Resolves a shared fee schedule by code.
///
/// Every call for the same code returns the same process-wide instance.
pub fn vehicle_type_for_code(code: &str) -> Option<Arc<dyn VehicleType>> {
    let schedule = match code.trim() {
        VEHICLE_TYPE_ECONOMY => &ECONOMY,
        VEHICLE_TYPE_COMPACT => &COMPACT,
        VEHICLE_TYPE_SUV => &SUV,
        VEHICLE_TYPE_LUXURY => &LUXURY,
        _ => return None,
    };
    Some(Lazy::force(schedule).clone())
}

#[cfg(test)]
mod tests {
    use super::{supported_vehicle_types, vehicle_type_for_code, Luxury, Suv, VehicleType};
    use std::sync::Arc;

    #[test]
    fn every_supported_code_resolves_to_matching_schedule() {
        for code in supported_vehicle_types() {
            let schedule = vehicle_type_for_code(code).expect("supported code");
            assert_eq!(schedule.code(), *code);
        }
        assert!(vehicle_type_for_code("tractor").is_none());
    }

    #[test]
    fn lookups_share_one_schedule_per_code() {
        let first = vehicle_type_for_code("suv").expect("suv");
        let second = vehicle_type_for_code(" suv ").expect("suv");
        assert!(Arc::ptr_eq(&first, &second));
        let luxury = vehicle_type_for_code("luxury").expect("luxury");
        assert!(!Arc::ptr_eq(&first, &luxury));
    }

    #[test]
    fn suv_surcharge_scales_with_days() {
        assert_eq!(Suv.additional_fees(1), 12.0);
        assert_eq!(Suv.additional_fees(5), 60.0);
    }

    #[test]
    fn luxury_discounts_days_after_first_week() {
        assert_eq!(Luxury.additional_fees(7), 280.0);
        assert_eq!(Luxury.additional_fees(10), 280.0 + 90.0);
    }
}
