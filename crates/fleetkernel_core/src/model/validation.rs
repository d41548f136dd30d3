//! Validation errors shared by entities and action requests.

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Invariant violation detected before pricing or persistence.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Rental range is inverted (`end_date < start_date`).
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    /// A monetary amount is negative or not finite.
    InvalidAmount { field: &'static str, value: f64 },
    /// A required text field is blank.
    EmptyField(&'static str),
    /// A request field is absent.
    MissingField(String),
    /// A request field could not be parsed.
    InvalidField { field: String, value: String },
    /// Vehicle type code is not part of the fee catalog.
    UnknownVehicleType(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndBeforeStart { start, end } => {
                write!(f, "rental end date {end} is before start date {start}")
            }
            Self::InvalidAmount { field, value } => {
                write!(f, "{field} must be a non-negative amount, got {value}")
            }
            Self::EmptyField(field) => write!(f, "{field} must not be empty"),
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
            Self::InvalidField { field, value } => {
                write!(f, "field `{field}` has invalid value `{value}`")
            }
            Self::UnknownVehicleType(code) => write!(f, "unknown vehicle type: {code}"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_amount(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidAmount { field, value })
    }
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(())
    }
}
