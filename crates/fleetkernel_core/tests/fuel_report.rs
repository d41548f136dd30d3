use fleetkernel_core::db::open_db_in_memory;
use fleetkernel_core::model::report::{total_fleet_percentage, total_vehicle_count};
use fleetkernel_core::repo::report_repo::ReportParams;
use fleetkernel_core::repo::vehicle_repo::VehicleRepository;
use fleetkernel_core::resource::ReportOrigin;
use fleetkernel_core::{
    CancellationToken, FleetStore, KernelError, ReportCatalog, SqliteFleetStore,
    ValidationError, VehicleDraft, VehicleStatus, FUEL_DISTRIBUTION_REPORT,
};

fn seeded_store(catalog: ReportCatalog) -> SqliteFleetStore {
    let mut store = SqliteFleetStore::new(open_db_in_memory().unwrap(), catalog).unwrap();
    for (model, fuel) in [
        ("Uno", "gasoline"),
        ("Mobi", "gasoline"),
        ("Argo", "gasoline"),
        ("Toro", "diesel"),
        ("Strada", "diesel"),
        ("Dolphin", "electric"),
    ] {
        store
            .vehicles()
            .create_vehicle(&VehicleDraft::new("Fiat", model, 2023, fuel, "economy"))
            .unwrap();
    }
    store.update_status(1, VehicleStatus::Rented).unwrap();
    store
}

#[test]
fn three_categories_sum_to_one_hundred_percent() {
    let mut store = seeded_store(ReportCatalog::builtin());

    let rows = store
        .report_data(
            FUEL_DISTRIBUTION_REPORT,
            &ReportParams::new(),
            &CancellationToken::new(),
        )
        .unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(total_vehicle_count(&rows), 6);
    assert!((total_fleet_percentage(&rows) - 100.0).abs() <= 0.5);

    let gasoline = &rows[0];
    assert_eq!(gasoline.fuel_type, "gasoline");
    assert_eq!(gasoline.vehicle_count, 3);
    assert_eq!(gasoline.available_count, 2);
    assert_eq!(gasoline.rented_count, 1);
    assert_eq!(gasoline.fleet_percentage, 50.0);
    assert_eq!(gasoline.chart_color, "#e53935");
}

#[test]
fn report_over_empty_fleet_has_no_rows() {
    let mut store =
        SqliteFleetStore::new(open_db_in_memory().unwrap(), ReportCatalog::builtin()).unwrap();

    let rows = store
        .report_data(
            FUEL_DISTRIBUTION_REPORT,
            &ReportParams::new(),
            &CancellationToken::new(),
        )
        .unwrap();
    assert!(rows.is_empty());
}

#[test]
fn missing_report_definition_is_resource_not_found() {
    let mut store = seeded_store(ReportCatalog::builtin());

    let err = store
        .report_data("report2", &ReportParams::new(), &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, KernelError::ResourceNotFound(path) if path == "report2"));
}

#[test]
fn directory_definitions_override_builtins_and_bind_parameters() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("report1.sql"),
        "SELECT
            fuel_type,
            COUNT(*) AS vehicle_count,
            SUM(CASE WHEN status = 'available' THEN 1 ELSE 0 END) AS available_count,
            SUM(CASE WHEN status = 'rented' THEN 1 ELSE 0 END) AS rented_count,
            100.0 AS fleet_percentage,
            '#123456' AS chart_color
        FROM vehicles
        WHERE fuel_type = :fuel
        GROUP BY fuel_type;",
    )
    .unwrap();
    let catalog = ReportCatalog::with_directory(dir.path());
    assert_eq!(
        catalog.load(FUEL_DISTRIBUTION_REPORT).unwrap().origin,
        ReportOrigin::Directory
    );
    let mut store = seeded_store(catalog);

    let mut params = ReportParams::new();
    params.insert("fuel".to_string(), "diesel".to_string());
    let rows = store
        .report_data(FUEL_DISTRIBUTION_REPORT, &params, &CancellationToken::new())
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].fuel_type, "diesel");
    assert_eq!(rows[0].vehicle_count, 2);
    assert_eq!(rows[0].chart_color, "#123456");
}

#[test]
fn unknown_parameter_is_a_validation_error() {
    let mut store = seeded_store(ReportCatalog::builtin());
    let mut params = ReportParams::new();
    params.insert("region".to_string(), "north".to_string());

    let err = store
        .report_data(FUEL_DISTRIBUTION_REPORT, &params, &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(
        err,
        KernelError::Validation(ValidationError::InvalidField { field, .. }) if field == "region"
    ));
}

#[test]
fn cancelled_token_aborts_report() {
    let mut store = seeded_store(ReportCatalog::builtin());
    let token = CancellationToken::new();
    token.cancel();

    let err = store
        .report_data(FUEL_DISTRIBUTION_REPORT, &ReportParams::new(), &token)
        .unwrap_err();
    assert!(matches!(err, KernelError::Cancelled));
}

#[test]
fn path_traversal_is_rejected() {
    let catalog = ReportCatalog::with_directory(std::env::temp_dir());
    let mut store = seeded_store(catalog);

    let err = store
        .report_data("../etc/passwd", &ReportParams::new(), &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, KernelError::Resource(_)));
}
