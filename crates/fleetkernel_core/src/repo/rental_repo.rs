//! Rental repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Write paths call `Rental::validate()` before SQL mutations.
//! - A rental is only inserted for an existing vehicle.
//! - The stored `total` is the pricing engine result at confirmation time.

use crate::model::rental::Rental;
use crate::model::vehicle::VehicleId;
use crate::repo::vehicle_repo::{vehicle_exists, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::Serialize;

/// Row id of a persisted rental.
pub type RentalId = i64;

/// Persisted rental as read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RentalRecord {
    pub id: RentalId,
    pub vehicle_id: VehicleId,
    pub vehicle_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub pickup_location: String,
    pub base_rate: f64,
    pub insurance_fee: f64,
    pub total: f64,
}

/// Repository interface for confirmed rentals.
pub trait RentalRepository {
    fn insert_rental(&self, rental: &Rental) -> RepoResult<RentalId>;
    fn list_rentals_for_vehicle(&self, vehicle_id: VehicleId) -> RepoResult<Vec<RentalRecord>>;
}

/// SQLite-backed rental repository.
pub struct SqliteRentalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRentalRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RentalRepository for SqliteRentalRepository<'_> {
    fn insert_rental(&self, rental: &Rental) -> RepoResult<RentalId> {
        rental.validate()?;
        let total = rental.calculate_total()?;

        if !vehicle_exists(self.conn, rental.vehicle_id())? {
            return Err(RepoError::VehicleNotFound(rental.vehicle_id()));
        }

        self.conn.execute(
            "INSERT INTO rentals (
                vehicle_id,
                vehicle_type,
                start_date,
                scheduled_end_date,
                pickup_location,
                base_rate,
                insurance_fee,
                total
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                rental.vehicle_id(),
                rental.vehicle_type().code(),
                rental.start_date(),
                rental.end_date(),
                rental.pickup_location(),
                rental.base_rate(),
                rental.insurance_fee(),
                total,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn list_rentals_for_vehicle(&self, vehicle_id: VehicleId) -> RepoResult<Vec<RentalRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                id,
                vehicle_id,
                vehicle_type,
                start_date,
                scheduled_end_date,
                pickup_location,
                base_rate,
                insurance_fee,
                total
            FROM rentals
            WHERE vehicle_id = ?1
            ORDER BY start_date ASC, id ASC;",
        )?;
        let mut rows = stmt.query([vehicle_id])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_rental_row(row)?);
        }
        Ok(records)
    }
}

fn parse_rental_row(row: &Row<'_>) -> RepoResult<RentalRecord> {
    Ok(RentalRecord {
        id: row.get("id")?,
        vehicle_id: row.get("vehicle_id")?,
        vehicle_type: row.get("vehicle_type")?,
        start_date: row.get("start_date")?,
        end_date: row.get("scheduled_end_date")?,
        pickup_location: row.get("pickup_location")?,
        base_rate: row.get("base_rate")?,
        insurance_fee: row.get("insurance_fee")?,
        total: row.get("total")?,
    })
}
