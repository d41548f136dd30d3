//! Fleet report rows.

use serde::{Deserialize, Serialize};

/// One fuel-type category of the fleet distribution report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelReport {
    pub fuel_type: String,
    pub vehicle_count: i64,
    pub available_count: i64,
    pub rented_count: i64,
    /// Share of the whole fleet, in percent.
    pub fleet_percentage: f64,
    /// CSS-style color used by chart renderers.
    pub chart_color: String,
}

/// Sum of `fleet_percentage` over all rows.
pub fn total_fleet_percentage(rows: &[FuelReport]) -> f64 {
    rows.iter().map(|row| row.fleet_percentage).sum()
}

/// Sum of `vehicle_count` over all rows.
pub fn total_vehicle_count(rows: &[FuelReport]) -> i64 {
    rows.iter().map(|row| row.vehicle_count).sum()
}
