//! Persistence boundary used by plugin actions.
//!
//! # Responsibility
//! - Expose the single-statement fleet operations actions depend on.
//! - Hide connection ownership from the kernel: the worker thread owns the
//!   store and actions only see `&mut dyn FleetStore`.
//!
//! # Invariants
//! - Every call is synchronous and fallible.
//! - `update_status` is idempotent on retries.
//! - `confirm_rental` never leaves a rental without the matching status change
//!   in the SQLite implementation.

use crate::error::{KernelError, KernelResult};
use crate::kernel::cancel::CancellationToken;
use crate::model::rental::Rental;
use crate::model::report::FuelReport;
use crate::model::vehicle::{VehicleId, VehicleStatus};
use crate::repo::rental_repo::{RentalId, RentalRepository, SqliteRentalRepository};
use crate::repo::report_repo::{ReportParams, SqliteReportRepository};
use crate::repo::vehicle_repo::{
    RepoError, SqliteVehicleRepository, VehicleIdAllocator, VehicleRepository,
};
use crate::resource::ReportCatalog;
use log::info;
use rusqlite::Connection;

/// Fleet persistence operations reachable from plugin actions.
pub trait FleetStore: Send {
    /// Sets the availability status of one vehicle.
    fn update_status(&mut self, vehicle_id: VehicleId, status: VehicleStatus) -> KernelResult<()>;

    /// Persists a confirmed rental.
    fn insert_rental(&mut self, rental: &Rental) -> KernelResult<RentalId>;

    /// Runs a report definition resolved by logical path.
    fn report_data(
        &mut self,
        report: &str,
        params: &ReportParams,
        token: &CancellationToken,
    ) -> KernelResult<Vec<FuelReport>>;

    /// Persists a rental and marks its vehicle as rented.
    fn confirm_rental(&mut self, rental: &Rental) -> KernelResult<RentalId> {
        let rental_id = self.insert_rental(rental)?;
        self.update_status(rental.vehicle_id(), VehicleStatus::Rented)?;
        Ok(rental_id)
    }
}

/// SQLite-backed fleet store.
pub struct SqliteFleetStore {
    conn: Connection,
    reports: ReportCatalog,
    ids: VehicleIdAllocator,
}

impl SqliteFleetStore {
    /// Wraps an opened (migrated) connection.
    pub fn new(conn: Connection, reports: ReportCatalog) -> KernelResult<Self> {
        let ids = SqliteVehicleRepository::try_new(&conn)?.allocator().clone();
        Ok(Self { conn, reports, ids })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn reports(&self) -> &ReportCatalog {
        &self.reports
    }

    /// Vehicle repository sharing this store's id allocator.
    pub fn vehicles(&self) -> SqliteVehicleRepository<'_> {
        SqliteVehicleRepository::with_allocator(&self.conn, self.ids.clone())
    }

    pub fn rentals(&self) -> SqliteRentalRepository<'_> {
        SqliteRentalRepository::new(&self.conn)
    }
}

impl FleetStore for SqliteFleetStore {
    fn update_status(&mut self, vehicle_id: VehicleId, status: VehicleStatus) -> KernelResult<()> {
        self.vehicles().update_status(vehicle_id, status)?;
        info!(
            "event=vehicle_status module=repo status=ok vehicle_id={vehicle_id} value={}",
            status.as_str()
        );
        Ok(())
    }

    fn insert_rental(&mut self, rental: &Rental) -> KernelResult<RentalId> {
        Ok(self.rentals().insert_rental(rental)?)
    }

    fn report_data(
        &mut self,
        report: &str,
        params: &ReportParams,
        token: &CancellationToken,
    ) -> KernelResult<Vec<FuelReport>> {
        let definition = self.reports.load(report)?;
        let rows = SqliteReportRepository::new(&self.conn).fuel_report(
            &definition,
            params,
            || !token.is_cancelled(),
        )?;
        if token.is_cancelled() {
            return Err(KernelError::Cancelled);
        }
        Ok(rows)
    }

    fn confirm_rental(&mut self, rental: &Rental) -> KernelResult<RentalId> {
        let ids = self.ids.clone();
        let tx = self.conn.transaction().map_err(RepoError::from)?;
        let rental_id = SqliteRentalRepository::new(&tx).insert_rental(rental)?;
        SqliteVehicleRepository::with_allocator(&tx, ids)
            .update_status(rental.vehicle_id(), VehicleStatus::Rented)?;
        tx.commit().map_err(RepoError::from)?;

        info!(
            "event=rental_confirm module=repo status=ok rental_id={rental_id} vehicle_id={}",
            rental.vehicle_id()
        );
        Ok(rental_id)
    }
}
