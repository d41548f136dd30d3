use fleetkernel_core::db::open_db;
use fleetkernel_core::repo::rental_repo::RentalRepository;
use fleetkernel_core::repo::vehicle_repo::VehicleRepository;
use fleetkernel_core::ui::NotificationLevel;
use fleetkernel_core::{
    ActionRequest, Content, Core, HeadlessUi, KernelError, PluginState, ReportCatalog,
    SqliteFleetStore, TaskWorker, ValidationError, VehicleDraft, VehicleStatus,
};
use fleetkernel_plugins::{builtin_catalog, fleet_status, fuel_report, rentals};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const IDLE_TIMEOUT: Duration = Duration::from_secs(5);

fn seeded_store(path: &Path) -> SqliteFleetStore {
    let conn = open_db(path).expect("open db");
    let store = SqliteFleetStore::new(conn, ReportCatalog::builtin()).expect("store");
    let vehicles = store.vehicles();
    for (make, model, fuel, vtype) in [
        ("Fiat", "Uno", "gasoline", "economy"),
        ("Toyota", "Corolla", "hybrid", "compact"),
        ("Jeep", "Compass", "diesel", "suv"),
        ("Fiat", "Mobi", "gasoline", "economy"),
    ] {
        vehicles
            .create_vehicle(&VehicleDraft::new(make, model, 2022, fuel, vtype))
            .expect("seed vehicle");
    }
    store
}

fn started_core() -> (TempDir, Core) {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = dir.path().join("fleet.db");
    drop(seeded_store(&db_path));

    let conn = open_db(&db_path).expect("reopen db");
    let store = SqliteFleetStore::new(conn, ReportCatalog::builtin()).expect("worker store");
    let worker = TaskWorker::spawn(Box::new(store)).expect("spawn worker");

    let core = Core::new();
    core.bootstrap(Box::new(HeadlessUi::new()), worker)
        .expect("bootstrap");
    let summary = core
        .discover(&builtin_catalog().expect("catalog"))
        .expect("discover");
    assert_eq!(summary.initialized.len(), 3);
    assert!(summary.failed.is_empty());
    (dir, core)
}

fn booking(vehicle_id: &str) -> ActionRequest {
    [
        ("vehicle_id", vehicle_id),
        ("vehicle_type", "economy"),
        ("base_rate", "50"),
        ("insurance_fee", "10"),
        ("start_date", "2024-01-01"),
        ("end_date", "2024-01-03"),
        ("pickup_location", "Airport"),
    ]
    .into_iter()
    .collect()
}

#[test]
fn discovery_registers_every_builtin_menu() {
    let (_dir, core) = started_core();
    let snapshot = core.ui_controller().expect("facade").snapshot();

    assert!(snapshot
        .find_menu_item(fleet_status::MENU_GROUP, fleet_status::RETURN_LABEL)
        .is_some());
    assert!(snapshot
        .find_menu_item(rentals::MENU_GROUP, rentals::CONFIRM_LABEL)
        .is_some());
    assert!(snapshot
        .find_menu_item(fuel_report::MENU_GROUP, fuel_report::MENU_LABEL)
        .is_some());
    assert!(core
        .plugins()
        .iter()
        .all(|descriptor| descriptor.state == PluginState::Initialized));
    core.shutdown();
}

#[test]
fn confirming_a_rental_persists_it_and_marks_vehicle_rented() {
    let (dir, core) = started_core();

    core.trigger_menu(rentals::MENU_GROUP, rentals::CONFIRM_LABEL, &booking("1"))
        .expect("trigger rental");
    let summary = core.wait_for_idle(IDLE_TIMEOUT).expect("pump");
    assert_eq!(summary.applied, 1);

    let snapshot = core.ui_controller().expect("facade").snapshot();
    match snapshot.content {
        Some(Content::Text { body }) => assert!(body.contains("total 160.00"), "{body}"),
        other => panic!("unexpected content: {other:?}"),
    }
    core.shutdown();

    let conn = open_db(dir.path().join("fleet.db")).expect("reopen db");
    let store = SqliteFleetStore::new(conn, ReportCatalog::builtin()).expect("store");
    let vehicle = store
        .vehicles()
        .get_vehicle(1)
        .expect("get vehicle")
        .expect("vehicle exists");
    assert_eq!(vehicle.status, VehicleStatus::Rented);
    let records = store
        .rentals()
        .list_rentals_for_vehicle(1)
        .expect("list rentals");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].total, 160.0);
}

#[test]
fn invalid_booking_is_rejected_before_dispatch() {
    let (_dir, core) = started_core();
    let request = booking("1").with("end_date", "2023-12-01");

    let err = core
        .trigger_menu(rentals::MENU_GROUP, rentals::CONFIRM_LABEL, &request)
        .expect_err("inverted range");
    assert!(matches!(
        err,
        KernelError::Validation(ValidationError::EndBeforeStart { .. })
    ));
    assert!(!core.has_pending());
    core.shutdown();
}

#[test]
fn booking_unknown_vehicle_raises_error_notification() {
    let (_dir, core) = started_core();

    core.trigger_menu(rentals::MENU_GROUP, rentals::CONFIRM_LABEL, &booking("999"))
        .expect("trigger rental");
    let summary = core.wait_for_idle(IDLE_TIMEOUT).expect("pump");
    assert_eq!(summary.failed, 1);

    let snapshot = core.ui_controller().expect("facade").snapshot();
    assert!(snapshot.content.is_none());
    let notification = snapshot.notifications.last().expect("notification");
    assert_eq!(notification.level, NotificationLevel::Error);
    assert!(notification.message.contains("999"), "{}", notification.message);
    core.shutdown();
}

#[test]
fn status_actions_update_vehicle_status() {
    let (_dir, core) = started_core();
    let request = ActionRequest::new().with("vehicle_id", "2");

    core.trigger_menu(
        fleet_status::MENU_GROUP,
        fleet_status::MAINTENANCE_LABEL,
        &request,
    )
    .expect("trigger maintenance");
    core.wait_for_idle(IDLE_TIMEOUT).expect("pump");
    let snapshot = core.ui_controller().expect("facade").snapshot();
    assert_eq!(
        snapshot.content,
        Some(Content::text("Vehicle 2 is now maintenance."))
    );

    core.trigger_menu(fleet_status::MENU_GROUP, fleet_status::RETURN_LABEL, &request)
        .expect("trigger return");
    core.trigger_menu(fleet_status::MENU_GROUP, fleet_status::RETURN_LABEL, &request)
        .expect("trigger return twice");
    let summary = core.wait_for_idle(IDLE_TIMEOUT).expect("pump");
    assert_eq!(summary.applied, 2);
    assert_eq!(summary.failed, 0);
    core.shutdown();
}

#[test]
fn fuel_report_opens_tab_with_chart() {
    let (_dir, core) = started_core();

    let job = core
        .trigger_menu(
            fuel_report::MENU_GROUP,
            fuel_report::MENU_LABEL,
            &ActionRequest::new(),
        )
        .expect("trigger report");
    let tab = job.tab().expect("report opens a tab");
    core.wait_for_idle(IDLE_TIMEOUT).expect("pump");

    let snapshot = core.ui_controller().expect("facade").snapshot();
    let tab = snapshot.tab(tab).expect("tab still open");
    assert_eq!(tab.title, fuel_report::TAB_TITLE);
    let Content::Stack { items } = &tab.content else {
        panic!("unexpected tab content: {:?}", tab.content);
    };
    let Content::PieChart(chart) = &items[0] else {
        panic!("first item should be the chart");
    };
    assert_eq!(chart.slices.len(), 3);
    assert_eq!(chart.slices[0].label, "gasoline");
    assert_eq!(chart.slices[0].value, 2.0);
    assert_eq!(chart.slices[0].color, "#e53935");
    core.shutdown();
}

#[test]
fn missing_report_definition_closes_tab_and_notifies() {
    let (_dir, core) = started_core();

    let job = core
        .trigger_menu(
            fuel_report::MENU_GROUP,
            fuel_report::MENU_LABEL,
            &ActionRequest::new().with(fuel_report::FIELD_REPORT, "report9"),
        )
        .expect("trigger report");
    core.wait_for_idle(IDLE_TIMEOUT).expect("pump");

    let snapshot = core.ui_controller().expect("facade").snapshot();
    assert!(snapshot.tab(job.tab().expect("tab")).is_none());
    let notification = snapshot.notifications.last().expect("notification");
    assert!(notification.message.contains("report9"));
    core.shutdown();
}
