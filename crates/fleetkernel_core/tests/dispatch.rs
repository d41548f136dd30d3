use fleetkernel_core::db::open_db_in_memory;
use fleetkernel_core::ui::NotificationLevel;
use fleetkernel_core::{
    task, ActionBinding, ActionRequest, Content, Core, DispatchSettings, HeadlessUi, KernelError,
    MenuItemHandle, ReportCatalog, RepoError, SqliteFleetStore, TaskWorker, ValidationError,
    VehicleStatus,
};
use std::sync::mpsc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const IDLE_TIMEOUT: Duration = Duration::from_secs(5);

fn core_with(settings: DispatchSettings) -> Core {
    let store = SqliteFleetStore::new(open_db_in_memory().unwrap(), ReportCatalog::builtin())
        .unwrap();
    let core = Core::new();
    core.bootstrap_with(
        Box::new(HeadlessUi::new()),
        TaskWorker::spawn(Box::new(store)).unwrap(),
        settings,
    )
    .unwrap();
    core
}

fn bind(core: &Core, label: &str, binding: ActionBinding) -> MenuItemHandle {
    let handle = core
        .ui_controller()
        .unwrap()
        .add_menu_entry("Test", label)
        .unwrap();
    core.bind_action(handle, binding).unwrap();
    handle
}

#[test]
fn successful_task_sets_primary_content() {
    let core = core_with(DispatchSettings::default());
    let handle = bind(
        &core,
        "Greet",
        ActionBinding::primary_content(|request| {
            let name = request.require("name")?.to_string();
            Ok(task(move |_, _| Ok(Content::text(format!("hello {name}")))))
        }),
    );

    let job = core
        .trigger(handle, &ActionRequest::new().with("name", "fleet"))
        .unwrap();
    assert!(job.tab().is_none());
    let summary = core.wait_for_idle(IDLE_TIMEOUT).unwrap();

    assert_eq!(summary.applied, 1);
    assert!(!core.has_pending());
    assert_eq!(
        core.ui_controller().unwrap().snapshot().content,
        Some(Content::text("hello fleet"))
    );
}

#[test]
fn prepare_errors_are_returned_to_the_caller() {
    let core = core_with(DispatchSettings::default());
    let handle = bind(
        &core,
        "Needs id",
        ActionBinding::primary_content(|request| {
            let id: i64 = request.parse("vehicle_id")?;
            Ok(task(move |_, _| Ok(Content::text(id.to_string()))))
        }),
    );

    let err = core.trigger(handle, &ActionRequest::new()).unwrap_err();
    assert!(matches!(
        err,
        KernelError::Validation(ValidationError::MissingField(field)) if field == "vehicle_id"
    ));
    assert_eq!(core.pending_jobs(), 0);
}

#[test]
fn persistence_failure_becomes_error_notification() {
    let core = core_with(DispatchSettings::default());
    let ui = core.ui_controller().unwrap();
    ui.set_content(Content::text("before")).unwrap();
    let handle = bind(
        &core,
        "Return",
        ActionBinding::primary_content(|_| {
            Ok(task(|store, _| {
                store.update_status(404, VehicleStatus::Available)?;
                Ok(Content::text("returned"))
            }))
        }),
    );

    core.trigger(handle, &ActionRequest::new()).unwrap();
    let summary = core.wait_for_idle(IDLE_TIMEOUT).unwrap();

    assert_eq!(summary.failed, 1);
    let snapshot = ui.snapshot();
    assert_eq!(snapshot.content, Some(Content::text("before")));
    assert_eq!(snapshot.notifications.len(), 1);
    assert_eq!(snapshot.notifications[0].level, NotificationLevel::Error);
    assert!(snapshot.notifications[0].message.contains("vehicle not found: 404"));
}

#[test]
fn programmer_errors_from_tasks_are_returned_not_notified() {
    let core = core_with(DispatchSettings::default());
    let handle = bind(
        &core,
        "Broken",
        ActionBinding::primary_content(|_| {
            Ok(task(|_, _| {
                Err(RepoError::Validation(ValidationError::EmptyField("make")).into())
            }))
        }),
    );

    core.trigger(handle, &ActionRequest::new()).unwrap();
    let err = core.wait_for_idle(IDLE_TIMEOUT).unwrap_err();

    assert!(matches!(
        err,
        KernelError::Validation(ValidationError::EmptyField("make"))
    ));
    assert!(core.ui_controller().unwrap().snapshot().notifications.is_empty());
}

#[test]
fn panicking_task_is_reported_and_worker_survives() {
    let core = core_with(DispatchSettings::default());
    let boom = bind(
        &core,
        "Boom",
        ActionBinding::primary_content(|_| Ok(task(|_, _| panic!("task exploded")))),
    );
    let ok = bind(
        &core,
        "Ok",
        ActionBinding::primary_content(|_| Ok(task(|_, _| Ok(Content::text("still alive"))))),
    );

    core.trigger(boom, &ActionRequest::new()).unwrap();
    core.trigger(ok, &ActionRequest::new()).unwrap();
    let summary = core.wait_for_idle(IDLE_TIMEOUT).unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.applied, 1);
    let snapshot = core.ui_controller().unwrap().snapshot();
    assert!(snapshot.notifications[0].message.contains("task exploded"));
    assert_eq!(snapshot.content, Some(Content::text("still alive")));
}

#[test]
fn new_tab_target_replaces_placeholder() {
    let core = core_with(DispatchSettings::default());
    let handle = bind(
        &core,
        "Report",
        ActionBinding::new_tab("Report", |_| Ok(task(|_, _| Ok(Content::text("rows"))))),
    );

    let job = core.trigger(handle, &ActionRequest::new()).unwrap();
    let tab = job.tab().unwrap();
    assert!(core
        .ui_controller()
        .unwrap()
        .snapshot()
        .tab(tab)
        .is_some());

    core.wait_for_idle(IDLE_TIMEOUT).unwrap();
    let snapshot = core.ui_controller().unwrap().snapshot();
    assert_eq!(snapshot.tab(tab).unwrap().content, Content::text("rows"));
}

#[test]
fn closing_the_tab_cancels_its_job() {
    let core = core_with(DispatchSettings::default());
    let (started_tx, started_rx) = mpsc::channel::<()>();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (observed_tx, observed_rx) = mpsc::channel::<bool>();
    let channels = Mutex::new(Some((started_tx, release_rx, observed_tx)));

    let handle = bind(
        &core,
        "Slow report",
        ActionBinding::new_tab("Slow", move |_| {
            let (started, release, observed) = channels.lock().unwrap().take().unwrap();
            Ok(task(move |_, token| {
                started.send(()).unwrap();
                release.recv().unwrap();
                observed.send(token.is_cancelled()).unwrap();
                token.check()?;
                Ok(Content::text("too late"))
            }))
        }),
    );

    let job = core.trigger(handle, &ActionRequest::new()).unwrap();
    started_rx.recv_timeout(IDLE_TIMEOUT).unwrap();
    let tab = job.tab().unwrap();
    core.close_tab(tab).unwrap();
    assert!(job.is_cancelled());
    release_tx.send(()).unwrap();

    assert!(observed_rx.recv_timeout(IDLE_TIMEOUT).unwrap());
    let summary = core.wait_for_idle(IDLE_TIMEOUT).unwrap();
    assert_eq!(summary.cancelled, 1);
    assert_eq!(summary.applied, 0);
    let snapshot = core.ui_controller().unwrap().snapshot();
    assert!(snapshot.tabs.is_empty());
    assert!(snapshot.notifications.is_empty());
}

#[test]
fn overdue_jobs_time_out() {
    let core = core_with(DispatchSettings {
        job_timeout: Some(Duration::from_millis(50)),
    });
    let handle = bind(
        &core,
        "Stuck",
        ActionBinding::new_tab("Stuck", |_| {
            Ok(task(|_, token| {
                let started = Instant::now();
                while !token.is_cancelled() && started.elapsed() < Duration::from_secs(2) {
                    std::thread::sleep(Duration::from_millis(5));
                }
                token.check()?;
                Ok(Content::text("finished"))
            }))
        }),
    );

    let job = core.trigger(handle, &ActionRequest::new()).unwrap();
    std::thread::sleep(Duration::from_millis(120));
    let summary = core.pump_completions().unwrap();

    assert_eq!(summary.timed_out, 1);
    assert!(job.is_cancelled());
    assert!(!core.has_pending());
    let snapshot = core.ui_controller().unwrap().snapshot();
    assert!(snapshot.tab(job.tab().unwrap()).is_none());
    assert!(snapshot.notifications[0].message.contains("timed out"));
}

#[test]
fn unbound_menu_item_is_unknown_action() {
    let core = core_with(DispatchSettings::default());
    let handle = core
        .ui_controller()
        .unwrap()
        .add_menu_entry("Test", "Unbound")
        .unwrap();

    assert!(matches!(
        core.trigger(handle, &ActionRequest::new()),
        Err(KernelError::UnknownAction(_))
    ));
    assert!(matches!(
        core.trigger_menu("Test", "Missing", &ActionRequest::new()),
        Err(KernelError::UnknownAction(_))
    ));
}

#[test]
fn jobs_can_be_cancelled_by_id() {
    let core = core_with(DispatchSettings::default());
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Mutex::new(Some(release_rx));
    let handle = bind(
        &core,
        "Wait",
        ActionBinding::primary_content(move |_| {
            let release = release_rx.lock().unwrap().take().unwrap();
            Ok(task(move |_, _| {
                release.recv().unwrap();
                Ok(Content::text("ignored"))
            }))
        }),
    );

    let job = core.trigger(handle, &ActionRequest::new()).unwrap();
    assert!(core.cancel_job(job.id()));
    // The worker may skip the task entirely once it sees the cancellation.
    let _ = release_tx.send(());

    let summary = core.wait_for_idle(IDLE_TIMEOUT).unwrap();
    assert_eq!(summary.cancelled, 1);
    assert!(core.ui_controller().unwrap().snapshot().content.is_none());
    assert!(!core.cancel_job(job.id()));
}
