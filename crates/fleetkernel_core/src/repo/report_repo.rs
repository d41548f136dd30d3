//! Report queries over the fleet store.
//!
//! # Invariants
//! - Query text comes from a `ReportDefinition`; this module never builds it.
//! - Reads are restartable: each call re-runs the query from scratch.
//! - Every named parameter supplied by the caller must exist in the query.

use crate::model::report::FuelReport;
use crate::model::validation::ValidationError;
use crate::repo::vehicle_repo::{RepoError, RepoResult};
use crate::resource::ReportDefinition;
use rusqlite::{Connection, Row};
use std::collections::BTreeMap;

/// Named query parameters (`:name` → value).
pub type ReportParams = BTreeMap<String, String>;

/// Runs report definitions against one connection.
pub struct SqliteReportRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReportRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Runs a fuel distribution report and maps one row per category.
    ///
    /// `should_continue` is polled between rows so abandoned reports stop early;
    /// returning `false` yields the rows read so far.
    pub fn fuel_report(
        &self,
        definition: &ReportDefinition,
        params: &ReportParams,
        mut should_continue: impl FnMut() -> bool,
    ) -> RepoResult<Vec<FuelReport>> {
        let mut stmt = self.conn.prepare(&definition.sql)?;
        for (name, value) in params {
            let placeholder = if name.starts_with(':') {
                name.clone()
            } else {
                format!(":{name}")
            };
            let index = stmt.parameter_index(&placeholder)?.ok_or_else(|| {
                RepoError::Validation(ValidationError::InvalidField {
                    field: name.clone(),
                    value: format!("not a parameter of report `{}`", definition.path),
                })
            })?;
            stmt.raw_bind_parameter(index, value.as_str())?;
        }

        let mut rows = stmt.raw_query();
        let mut reports = Vec::new();
        while let Some(row) = rows.next()? {
            if !should_continue() {
                break;
            }
            reports.push(parse_fuel_report_row(row)?);
        }
        Ok(reports)
    }
}

fn parse_fuel_report_row(row: &Row<'_>) -> RepoResult<FuelReport> {
    let fuel_type: String = row.get("fuel_type")?;
    let report = FuelReport {
        vehicle_count: row.get("vehicle_count")?,
        available_count: row.get("available_count")?,
        rented_count: row.get("rented_count")?,
        fleet_percentage: row.get("fleet_percentage")?,
        chart_color: row.get("chart_color")?,
        fuel_type,
    };
    if report.available_count + report.rented_count > report.vehicle_count {
        return Err(RepoError::InvalidData(format!(
            "status counts exceed vehicle count for fuel type `{}`",
            report.fuel_type
        )));
    }
    Ok(report)
}
