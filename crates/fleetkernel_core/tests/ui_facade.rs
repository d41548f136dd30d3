use fleetkernel_core::db::open_db_in_memory;
use fleetkernel_core::{
    Content, Core, HeadlessUi, KernelError, ReportCatalog, SqliteFleetStore, TaskWorker,
    ValidationError,
};

fn bootstrapped_core() -> Core {
    let store = SqliteFleetStore::new(open_db_in_memory().unwrap(), ReportCatalog::builtin())
        .unwrap();
    let core = Core::new();
    core.bootstrap(
        Box::new(HeadlessUi::new()),
        TaskWorker::spawn(Box::new(store)).unwrap(),
    )
    .unwrap();
    core
}

#[test]
fn add_menu_item_is_additive_and_ordered() {
    let core = bootstrapped_core();
    let ui = core.ui_controller().unwrap();

    let h1 = ui.create_menu_item("Fuel distribution", "Reports").unwrap();
    let h2 = ui.create_menu_item("Monthly revenue", "Reports").unwrap();
    assert!(ui.snapshot().menu_group("Reports").is_none());

    ui.add_menu_item("Reports", h1).unwrap();
    ui.add_menu_item("Reports", h2).unwrap();

    assert_eq!(ui.snapshot().menu_handles("Reports"), vec![h1, h2]);
}

#[test]
fn attaching_the_same_item_twice_is_rejected() {
    let core = bootstrapped_core();
    let ui = core.ui_controller().unwrap();
    let handle = ui.add_menu_entry("Fleet", "Return vehicle").unwrap();

    let err = ui.add_menu_item("Fleet", handle).unwrap_err();
    assert!(matches!(err, KernelError::Ui(_)));
    assert_eq!(ui.snapshot().menu_handles("Fleet"), vec![handle]);
}

#[test]
fn create_tab_never_replaces_existing_tabs() {
    let core = bootstrapped_core();
    let ui = core.ui_controller().unwrap();

    let first = ui.create_tab("Report", Content::text("one")).unwrap();
    let second = ui.create_tab("Report", Content::text("two")).unwrap();

    let snapshot = ui.snapshot();
    assert_ne!(first, second);
    assert_eq!(snapshot.tabs.len(), 2);
    assert_eq!(snapshot.tab(first).unwrap().content, Content::text("one"));
    assert_eq!(snapshot.tab(second).unwrap().content, Content::text("two"));
}

#[test]
fn set_content_is_last_writer_wins() {
    let core = bootstrapped_core();
    let ui = core.ui_controller().unwrap();

    ui.set_content(Content::text("first")).unwrap();
    ui.set_content(Content::text("second")).unwrap();

    assert_eq!(ui.snapshot().content, Some(Content::text("second")));
}

#[test]
fn blank_labels_are_validation_errors() {
    let core = bootstrapped_core();
    let ui = core.ui_controller().unwrap();

    assert!(matches!(
        ui.create_menu_item("  ", "Reports"),
        Err(KernelError::Validation(ValidationError::EmptyField("label")))
    ));
    assert!(matches!(
        ui.create_tab("", Content::text("x")),
        Err(KernelError::Validation(ValidationError::EmptyField("title")))
    ));
}

#[test]
fn concurrent_registrations_are_all_kept() {
    let core = bootstrapped_core();

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let core = &core;
            scope.spawn(move || {
                let ui = core.ui_controller().unwrap();
                for item in 0..10 {
                    ui.add_menu_entry("Reports", &format!("report {worker}-{item}"))
                        .unwrap();
                }
            });
        }
    });

    let handles = core.ui_controller().unwrap().snapshot().menu_handles("Reports");
    assert_eq!(handles.len(), 40);
}

#[test]
fn global_instance_requires_bootstrap_before_use() {
    // Nothing else in this test binary touches the process-wide core.
    let core = Core::instance();
    assert!(!core.is_bootstrapped());
    assert!(matches!(core.ui_controller(), Err(KernelError::NotInitialized)));
}
