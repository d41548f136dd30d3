//! Rental domain model.
//!
//! # Responsibility
//! - Define the fleet entities (`Vehicle`, `Rental`) and fee schedules.
//! - Keep pricing rules next to the data they price.
//!
//! # Invariants
//! - Vehicle ids are assigned once by the repository allocator, never by callers.
//! - A `Rental` never changes after construction.
//! - Pricing dispatch is polymorphic over `VehicleType`; callers never inspect
//!   the concrete variant.

pub mod rental;
pub mod report;
pub mod validation;
pub mod vehicle;
pub mod vehicle_type;
