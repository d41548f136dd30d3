//! Vehicle entity.
//!
//! # Responsibility
//! - Describe one fleet vehicle and its rental availability.
//!
//! # Invariants
//! - `id` is assigned exactly once by `VehicleIdAllocator` and never changes.
//! - `status` is the only attribute mutated after creation.

use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};

/// Integer identity of one vehicle, unique across the fleet.
pub type VehicleId = i64;

/// Rental availability of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    Rented,
    Maintenance,
}

impl VehicleStatus {
    /// Stable storage/wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Rented => "rented",
            Self::Maintenance => "maintenance",
        }
    }

    /// Parses a storage/wire value, accepting surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "available" => Some(Self::Available),
            "rented" => Some(Self::Rented),
            "maintenance" => Some(Self::Maintenance),
            _ => None,
        }
    }
}

/// Vehicle attributes supplied by callers before an id is allocated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleDraft {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub fuel_type: String,
    pub transmission: String,
    pub mileage: u32,
    pub status: VehicleStatus,
    /// Fee schedule code, see `vehicle_type_for_code`.
    pub vehicle_type: String,
}

impl VehicleDraft {
    /// Creates an available vehicle draft with zero mileage.
    pub fn new(
        make: impl Into<String>,
        model: impl Into<String>,
        year: i32,
        fuel_type: impl Into<String>,
        vehicle_type: impl Into<String>,
    ) -> Self {
        Self {
            make: make.into(),
            model: model.into(),
            year,
            fuel_type: fuel_type.into(),
            transmission: "manual".to_string(),
            mileage: 0,
            status: VehicleStatus::Available,
            vehicle_type: vehicle_type.into(),
        }
    }

    /// Checks the text attributes a vehicle record cannot live without.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("make", &self.make)?;
        require_text("model", &self.model)?;
        require_text("fuel_type", &self.fuel_type)?;
        require_text("transmission", &self.transmission)?;
        require_text("vehicle_type", &self.vehicle_type)?;
        Ok(())
    }
}

/// Persisted fleet vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vehicle {
    id: VehicleId,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub fuel_type: String,
    pub transmission: String,
    pub mileage: u32,
    pub status: VehicleStatus,
    #[serde(rename = "type")]
    pub vehicle_type: String,
}

impl Vehicle {
    pub(crate) fn with_id(id: VehicleId, draft: VehicleDraft) -> Self {
        Self {
            id,
            make: draft.make,
            model: draft.model,
            year: draft.year,
            fuel_type: draft.fuel_type,
            transmission: draft.transmission,
            mileage: draft.mileage,
            status: draft.status,
            vehicle_type: draft.vehicle_type,
        }
    }

    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }
}
