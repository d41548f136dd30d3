//! Fleet distribution by fuel type, rendered as a pie chart in its own tab.

use fleetkernel_core::repo::report_repo::ReportParams;
use fleetkernel_core::ui::{PieChart, PieSlice, Table};
use fleetkernel_core::{
    task, ActionBinding, ActionRequest, Contribution, Content, Core, FuelReport, KernelResult,
    Plugin, PluginManifest, Task, FUEL_DISTRIBUTION_REPORT,
};
use log::debug;

pub const PLUGIN_ID: &str = "builtin.reports.fuel";
pub const MENU_GROUP: &str = "Reports";
pub const MENU_LABEL: &str = "Fuel distribution";
pub const TAB_TITLE: &str = "Fleet by fuel type";
pub const CHART_TITLE: &str = "Vehicle distribution by fuel type";

/// Optional request field naming another report definition.
pub const FIELD_REPORT: &str = "report";
/// Request fields with this prefix are bound as named report parameters.
pub const PARAM_PREFIX: &str = "param.";

pub struct FuelReportPlugin {
    manifest: PluginManifest,
}

impl FuelReportPlugin {
    pub fn new() -> Self {
        Self {
            manifest: PluginManifest::new(
                PLUGIN_ID,
                env!("CARGO_PKG_VERSION"),
                &[Contribution::MenuItem, Contribution::Tab],
            ),
        }
    }
}

impl Default for FuelReportPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for FuelReportPlugin {
    fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    fn init(&self, core: &Core) -> KernelResult<bool> {
        let ui = core.ui_controller()?;
        let handle = ui.add_menu_entry(MENU_GROUP, MENU_LABEL)?;
        core.bind_action(handle, ActionBinding::new_tab(TAB_TITLE, prepare_report))?;
        Ok(true)
    }
}

fn prepare_report(request: &ActionRequest) -> KernelResult<Task> {
    let report = request
        .get(FIELD_REPORT)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(FUEL_DISTRIBUTION_REPORT)
        .to_string();
    let params: ReportParams = request
        .fields()
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(PARAM_PREFIX)
                .map(|name| (name.to_string(), value.clone()))
        })
        .collect();
    debug!(
        "event=report_prepare module=plugins status=ok report={report} params={}",
        params.len()
    );

    Ok(task(move |store, token| {
        let rows = store.report_data(&report, &params, token)?;
        Ok(render_report(&rows))
    }))
}

/// Turns report rows into a chart plus a detail table.
pub fn render_report(rows: &[FuelReport]) -> Content {
    if rows.is_empty() {
        return Content::text("No vehicles in the fleet.");
    }

    let chart = PieChart {
        title: CHART_TITLE.to_string(),
        slices: rows
            .iter()
            .map(|row| PieSlice {
                label: row.fuel_type.clone(),
                value: row.vehicle_count as f64,
                color: row.chart_color.clone(),
            })
            .collect(),
    };
    let table = Table {
        columns: ["Fuel", "Vehicles", "Available", "Rented", "Fleet %"]
            .into_iter()
            .map(str::to_string)
            .collect(),
        rows: rows
            .iter()
            .map(|row| {
                vec![
                    row.fuel_type.clone(),
                    row.vehicle_count.to_string(),
                    row.available_count.to_string(),
                    row.rented_count.to_string(),
                    format!("{:.2}", row.fleet_percentage),
                ]
            })
            .collect(),
    };
    Content::Stack {
        items: vec![Content::PieChart(chart), Content::Table(table)],
    }
}
