//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for the fleet.
//! - Isolate SQLite query details from the kernel and plugins.
//!
//! # Invariants
//! - Repository writes validate entities before persistence.
//! - Repository APIs return semantic errors (`VehicleNotFound`) in addition
//!   to DB transport errors.

pub mod fleet_store;
pub mod rental_repo;
pub mod report_repo;
pub mod vehicle_repo;
