//! Vehicle repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist fleet vehicles and their availability status.
//! - Own the vehicle id counter (`VehicleIdAllocator`).
//!
//! # Invariants
//! - Ids come from the allocator only; callers never choose them.
//! - Concurrent allocations never collide and form a contiguous range.
//! - An id is consumed before the INSERT; a rejected insert leaves a gap.
//! - Status updates are idempotent.

use crate::db::DbError;
use crate::model::validation::ValidationError;
use crate::model::vehicle::{Vehicle, VehicleDraft, VehicleId, VehicleStatus};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

const VEHICLE_SELECT_SQL: &str = "SELECT
    id,
    make,
    model,
    year,
    fuel_type,
    transmission,
    mileage,
    status,
    vehicle_type
FROM vehicles";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by fleet persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    VehicleNotFound(VehicleId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::VehicleNotFound(id) => write!(f, "vehicle not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted fleet data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::VehicleNotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Monotonic vehicle id counter.
///
/// Clones share one counter, so handing a clone to each thread still yields
/// unique ids. Ids are never handed back, even when the insert that took one
/// fails.
#[derive(Debug, Clone)]
pub struct VehicleIdAllocator {
    next: Arc<AtomicI64>,
}

impl VehicleIdAllocator {
    /// First id handed out by a fresh allocator.
    pub const INITIAL_ID: VehicleId = 1;

    pub fn new() -> Self {
        Self::starting_at(Self::INITIAL_ID)
    }

    pub fn starting_at(first: VehicleId) -> Self {
        Self {
            next: Arc::new(AtomicI64::new(first)),
        }
    }

    /// Returns the next unused id.
    pub fn next_id(&self) -> VehicleId {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// Returns the id the next allocation will use, without consuming it.
    pub fn peek(&self) -> VehicleId {
        self.next.load(Ordering::SeqCst)
    }

    /// Rewinds the counter. Test fixtures only; never reuse ids of live rows.
    pub fn reset(&self, first: VehicleId) {
        self.next.store(first, Ordering::SeqCst);
    }

    /// Creates a vehicle entity under a freshly allocated id.
    pub fn allocate(&self, draft: VehicleDraft) -> Vehicle {
        Vehicle::with_id(self.next_id(), draft)
    }
}

impl Default for VehicleIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Filter options for listing vehicles.
#[derive(Debug, Clone, Default)]
pub struct VehicleListQuery {
    pub status: Option<VehicleStatus>,
    pub fuel_type: Option<String>,
}

/// Repository interface for fleet vehicles.
pub trait VehicleRepository {
    fn create_vehicle(&self, draft: &VehicleDraft) -> RepoResult<Vehicle>;
    fn get_vehicle(&self, id: VehicleId) -> RepoResult<Option<Vehicle>>;
    fn list_vehicles(&self, query: &VehicleListQuery) -> RepoResult<Vec<Vehicle>>;
    fn update_status(&self, id: VehicleId, status: VehicleStatus) -> RepoResult<()>;
}

/// SQLite-backed vehicle repository.
pub struct SqliteVehicleRepository<'conn> {
    conn: &'conn Connection,
    ids: VehicleIdAllocator,
}

impl<'conn> SqliteVehicleRepository<'conn> {
    /// Creates a repository whose allocator continues after the highest stored id.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let max_id: VehicleId =
            conn.query_row("SELECT COALESCE(MAX(id), 0) FROM vehicles;", [], |row| {
                row.get(0)
            })?;
        let first = (max_id + 1).max(VehicleIdAllocator::INITIAL_ID);
        Ok(Self::with_allocator(conn, VehicleIdAllocator::starting_at(first)))
    }

    /// Creates a repository with an injected allocator.
    pub fn with_allocator(conn: &'conn Connection, ids: VehicleIdAllocator) -> Self {
        Self { conn, ids }
    }

    pub fn allocator(&self) -> &VehicleIdAllocator {
        &self.ids
    }
}

impl VehicleRepository for SqliteVehicleRepository<'_> {
    fn create_vehicle(&self, draft: &VehicleDraft) -> RepoResult<Vehicle> {
        draft.validate()?;
        let vehicle = self.ids.allocate(draft.clone());

        self.conn.execute(
            "INSERT INTO vehicles (
                id,
                make,
                model,
                year,
                fuel_type,
                transmission,
                mileage,
                status,
                vehicle_type
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                vehicle.id(),
                vehicle.make.as_str(),
                vehicle.model.as_str(),
                vehicle.year,
                vehicle.fuel_type.as_str(),
                vehicle.transmission.as_str(),
                vehicle.mileage,
                vehicle.status.as_str(),
                vehicle.vehicle_type.as_str(),
            ],
        )?;

        Ok(vehicle)
    }

    fn get_vehicle(&self, id: VehicleId) -> RepoResult<Option<Vehicle>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{VEHICLE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_vehicle_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_vehicles(&self, query: &VehicleListQuery) -> RepoResult<Vec<Vehicle>> {
        let mut sql = format!("{VEHICLE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(fuel_type) = query.fuel_type.as_deref() {
            sql.push_str(" AND fuel_type = ?");
            bind_values.push(Value::Text(fuel_type.trim().to_string()));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut vehicles = Vec::new();
        while let Some(row) = rows.next()? {
            vehicles.push(parse_vehicle_row(row)?);
        }
        Ok(vehicles)
    }

    fn update_status(&self, id: VehicleId, status: VehicleStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE vehicles
             SET
                status = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2;",
            params![status.as_str(), id],
        )?;

        if changed == 0 {
            return Err(RepoError::VehicleNotFound(id));
        }
        Ok(())
    }
}

/// Returns whether a vehicle row exists.
pub(crate) fn vehicle_exists(conn: &Connection, id: VehicleId) -> RepoResult<bool> {
    let found = conn
        .query_row("SELECT 1 FROM vehicles WHERE id = ?1;", [id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

fn parse_vehicle_row(row: &Row<'_>) -> RepoResult<Vehicle> {
    let id: VehicleId = row.get("id")?;
    let status_text: String = row.get("status")?;
    let status = VehicleStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in vehicles.status for id {id}"
        ))
    })?;
    let mileage: i64 = row.get("mileage")?;
    let mileage = u32::try_from(mileage).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid mileage `{mileage}` in vehicles.mileage for id {id}"
        ))
    })?;

    let draft = VehicleDraft {
        make: row.get("make")?,
        model: row.get("model")?,
        year: row.get("year")?,
        fuel_type: row.get("fuel_type")?,
        transmission: row.get("transmission")?,
        mileage,
        status,
        vehicle_type: row.get("vehicle_type")?,
    };
    Ok(Vehicle::with_id(id, draft))
}
