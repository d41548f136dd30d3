//! Rental entity and pricing engine.
//!
//! # Responsibility
//! - Capture the confirmed terms of one booking.
//! - Compute the rental total from day count, base rate, fee schedule and
//!   insurance.
//!
//! # Invariants
//! - `end_date >= start_date`; the range is inclusive on both ends.
//! - Rentals are immutable; modifications are new rental records.

use crate::model::validation::{require_amount, require_text, ValidationError};
use crate::model::vehicle::VehicleId;
use crate::model::vehicle_type::VehicleType;
use chrono::NaiveDate;
use std::sync::Arc;

/// Confirmed booking of one vehicle under one fee schedule.
#[derive(Debug, Clone)]
pub struct Rental {
    vehicle_id: VehicleId,
    vehicle_type: Arc<dyn VehicleType>,
    base_rate: f64,
    insurance_fee: f64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    pickup_location: String,
}

impl Rental {
    /// Builds a rental from booking terms.
    ///
    /// Construction does not validate; `validate()` runs on every pricing and
    /// persistence path.
    pub fn new(
        vehicle_id: VehicleId,
        vehicle_type: Arc<dyn VehicleType>,
        base_rate: f64,
        insurance_fee: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        pickup_location: impl Into<String>,
    ) -> Self {
        Self {
            vehicle_id,
            vehicle_type,
            base_rate,
            insurance_fee,
            start_date,
            end_date,
            pickup_location: pickup_location.into(),
        }
    }

    pub fn vehicle_id(&self) -> VehicleId {
        self.vehicle_id
    }

    pub fn vehicle_type(&self) -> &Arc<dyn VehicleType> {
        &self.vehicle_type
    }

    pub fn base_rate(&self) -> f64 {
        self.base_rate
    }

    pub fn insurance_fee(&self) -> f64 {
        self.insurance_fee
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn pickup_location(&self) -> &str {
        &self.pickup_location
    }

    /// Validates all booking invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.rental_days()?;
        require_amount("base_rate", self.base_rate)?;
        require_amount("insurance_fee", self.insurance_fee)?;
        require_text("pickup_location", &self.pickup_location)?;
        Ok(())
    }

    /// Inclusive day count: `(end_date - start_date) + 1`.
    pub fn rental_days(&self) -> Result<u32, ValidationError> {
        if self.end_date < self.start_date {
            return Err(ValidationError::EndBeforeStart {
                start: self.start_date,
                end: self.end_date,
            });
        }
        let elapsed = (self.end_date - self.start_date).num_days();
        u32::try_from(elapsed + 1).map_err(|_| ValidationError::InvalidField {
            field: "end_date".to_string(),
            value: self.end_date.to_string(),
        })
    }

    /// `base_rate * days + additional_fees(days) + insurance_fee`.
    pub fn calculate_total(&self) -> Result<f64, ValidationError> {
        let days = self.rental_days()?;
        let daily_value = self.base_rate * f64::from(days);
        Ok(daily_value + self.vehicle_type.additional_fees(days) + self.insurance_fee)
    }
}

#[cfg(test)]
mod tests {
    use super::Rental;
    use crate::model::validation::ValidationError;
    use crate::model::vehicle_type::{Compact, Economy};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).expect("valid date")
    }

    #[test]
    fn three_day_economy_rental_totals_160() {
        let rental = Rental::new(1, Arc::new(Economy), 50.0, 10.0, date(1), date(3), "Airport");
        assert_eq!(rental.rental_days(), Ok(3));
        assert_eq!(rental.calculate_total(), Ok(160.0));
    }

    #[test]
    fn same_day_rental_counts_one_day() {
        let rental = Rental::new(1, Arc::new(Compact), 80.0, 0.0, date(5), date(5), "Downtown");
        assert_eq!(rental.rental_days(), Ok(1));
        assert_eq!(rental.calculate_total(), Ok(95.0));
    }

    #[test]
    fn inverted_range_fails_validation() {
        let rental = Rental::new(1, Arc::new(Economy), 50.0, 10.0, date(3), date(1), "Airport");
        assert!(matches!(
            rental.calculate_total(),
            Err(ValidationError::EndBeforeStart { .. })
        ));
    }

    #[test]
    fn negative_rate_fails_validation() {
        let rental = Rental::new(1, Arc::new(Economy), -1.0, 0.0, date(1), date(2), "Airport");
        assert!(matches!(
            rental.validate(),
            Err(ValidationError::InvalidAmount {
                field: "base_rate",
                ..
            })
        ));
    }
}
