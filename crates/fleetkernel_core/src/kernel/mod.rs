//! Core registry: the one shared access point plugins are initialized against.
//!
//! # Responsibility
//! - Bind a concrete `UiController` and the task worker exactly once.
//! - Run plugin discovery in catalog order with skip-and-continue semantics.
//! - Track plugin descriptors, action bindings and outstanding jobs.
//! - Apply worker completions on the thread that pumps the core.
//!
//! # Invariants
//! - `ui_controller`, `bind_action`, `discover` and `trigger` fail with
//!   `NotInitialized` before `bootstrap`.
//! - A failing plugin never aborts discovery; its extension points, menu
//!   attachments and action bindings are rolled back, and bindings it replaced
//!   are restored.
//! - Only calls made on the discovery thread are attributed to the plugin in
//!   `init`; other threads register as the host.
//! - Facade writes are serialized by a per-call lock; no kernel lock is held
//!   while plugin code runs, and the registry lock is never held while the UI
//!   lock is acquired.

pub mod cancel;
pub mod descriptor;
pub mod dispatch;
pub mod facade;
pub mod worker;

use crate::error::{KernelError, KernelResult};
use crate::extension::catalog::PluginCatalog;
use crate::extension::contribution::Contribution;
use crate::extension::plugin::Plugin;
use crate::logging::panic_payload_message;
use crate::ui::{Content, ExtensionPoint, MenuItemHandle, Notification, TabHandle, UiController};
use cancel::CancellationToken;
use descriptor::{DiscoveryOptions, InitSummary, PluginDescriptor, PluginState};
use dispatch::{
    ActionBinding, ActionRequest, ActionTarget, Completion, Job, JobHandle, JobId, PumpSummary,
};
use facade::UiFacade;
use log::{debug, error, info, warn};
use once_cell::sync::{Lazy, OnceCell};
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};
use uuid::Uuid;
use worker::TaskWorker;

const PLACEHOLDER_MESSAGE: &str = "Loading...";
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(25);
/// Owner recorded for actions bound outside plugin discovery.
const HOST_OWNER: &str = "host";

static INSTANCE: Lazy<Core> = Lazy::new(Core::new);

/// Dispatch tuning applied at bootstrap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Jobs still outstanding after this long are cancelled at pump time.
    pub job_timeout: Option<Duration>,
}

struct Bindings {
    ui: Mutex<Box<dyn UiController>>,
    worker: Mutex<TaskWorker>,
    settings: DispatchSettings,
}

/// Extension points registered by the plugin currently in `init`.
struct InitScope {
    plugin_id: String,
    thread: ThreadId,
    declared: BTreeSet<Contribution>,
    points: Vec<ExtensionPoint>,
    /// Pre-existing menu items the plugin attached to a group.
    attached: Vec<MenuItemHandle>,
    /// Bound handles, each with the action it displaced.
    actions: Vec<(MenuItemHandle, Option<BoundAction>)>,
    previous_content: Option<Option<Content>>,
}

impl InitScope {
    fn created_menu_item(&self, handle: MenuItemHandle) -> bool {
        self.points.contains(&ExtensionPoint::MenuItem(handle))
    }
}

#[derive(Clone)]
struct BoundAction {
    plugin_id: String,
    binding: ActionBinding,
}

struct PendingJob {
    plugin_id: String,
    tab: Option<TabHandle>,
    token: CancellationToken,
    started_at: Instant,
}

#[derive(Default)]
struct Registry {
    descriptors: Vec<PluginDescriptor>,
    scope: Option<InitScope>,
    actions: BTreeMap<MenuItemHandle, BoundAction>,
}

impl Registry {
    fn upsert(&mut self, descriptor: PluginDescriptor) {
        match self
            .descriptors
            .iter_mut()
            .find(|existing| existing.id == descriptor.id)
        {
            Some(existing) => *existing = descriptor,
            None => self.descriptors.push(descriptor),
        }
    }

    /// Scope of the plugin in `init`, if the caller is the discovery thread.
    fn active_scope(&self) -> Option<&InitScope> {
        let current = thread::current().id();
        self.scope.as_ref().filter(|scope| scope.thread == current)
    }

    fn active_scope_mut(&mut self) -> Option<&mut InitScope> {
        let current = thread::current().id();
        self.scope.as_mut().filter(|scope| scope.thread == current)
    }

    fn state_of(&self, plugin_id: &str) -> Option<PluginState> {
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.id == plugin_id)
            .map(|descriptor| descriptor.state)
    }
}

/// Shared context handed to every plugin's `init`.
///
/// Hosts either own a `Core` (`Core::new`) and pass it around explicitly, or
/// use the lazily created process-wide one from `Core::instance`.
pub struct Core {
    bound: OnceCell<Bindings>,
    registry: Mutex<Registry>,
    pending: Mutex<BTreeMap<JobId, PendingJob>>,
    discovery: Mutex<()>,
}

impl Default for Core {
    fn default() -> Self {
        Self::new()
    }
}

impl Core {
    /// Unbound core; call `bootstrap` before handing it to plugins.
    pub fn new() -> Self {
        Self {
            bound: OnceCell::new(),
            registry: Mutex::new(Registry::default()),
            pending: Mutex::new(BTreeMap::new()),
            discovery: Mutex::new(()),
        }
    }

    /// Process-wide core, created on first access.
    pub fn instance() -> &'static Core {
        &INSTANCE
    }

    /// Binds the UI facade and worker with default dispatch settings.
    pub fn bootstrap(&self, ui: Box<dyn UiController>, worker: TaskWorker) -> KernelResult<()> {
        self.bootstrap_with(ui, worker, DispatchSettings::default())
    }

    /// Binds the UI facade and worker.
    ///
    /// # Errors
    /// - `AlreadyInitialized` when called a second time; the passed worker is
    ///   shut down.
    pub fn bootstrap_with(
        &self,
        ui: Box<dyn UiController>,
        worker: TaskWorker,
        settings: DispatchSettings,
    ) -> KernelResult<()> {
        let bindings = Bindings {
            ui: Mutex::new(ui),
            worker: Mutex::new(worker),
            settings,
        };
        if self.bound.set(bindings).is_err() {
            warn!("event=core_bootstrap module=kernel status=error reason=already_initialized");
            return Err(KernelError::AlreadyInitialized);
        }
        info!(
            "event=core_bootstrap module=kernel status=ok job_timeout_ms={}",
            settings
                .job_timeout
                .map(|timeout| timeout.as_millis().to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        Ok(())
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.bound.get().is_some()
    }

    fn bindings(&self) -> KernelResult<&Bindings> {
        self.bound.get().ok_or(KernelError::NotInitialized)
    }

    /// Returns the bound UI extension facade.
    ///
    /// Calls made through it on the thread running discovery are checked
    /// against, and attributed to, the plugin currently in `init`. Calls from
    /// any other thread are host registrations.
    ///
    /// # Errors
    /// - `NotInitialized` before `bootstrap`.
    pub fn ui_controller(&self) -> KernelResult<UiFacade<'_>> {
        let bindings = self.bindings()?;
        Ok(UiFacade::new(self, &bindings.ui))
    }

    /// Binds an action to a menu item.
    ///
    /// Rebinding a handle replaces its previous action. A plugin that fails
    /// `init` gets the replaced action restored.
    pub fn bind_action(&self, handle: MenuItemHandle, binding: ActionBinding) -> KernelResult<()> {
        self.bindings()?;
        let mut registry = lock(&self.registry);
        let plugin_id = registry
            .active_scope()
            .map_or_else(|| HOST_OWNER.to_string(), |scope| scope.plugin_id.clone());
        debug!("event=action_bind module=kernel status=ok plugin={plugin_id} menu_item={handle}");
        let displaced = registry
            .actions
            .insert(handle, BoundAction { plugin_id, binding });
        if let Some(scope) = registry.active_scope_mut() {
            scope.actions.push((handle, displaced));
        }
        Ok(())
    }

    pub fn is_bound(&self, handle: MenuItemHandle) -> bool {
        lock(&self.registry).actions.contains_key(&handle)
    }

    /// Initializes every catalog plugin in catalog order.
    pub fn discover(&self, catalog: &PluginCatalog) -> KernelResult<InitSummary> {
        self.discover_with(catalog, &DiscoveryOptions::default())
    }

    /// Initializes catalog plugins, leaving disabled ones `uninitialized`.
    ///
    /// Plugins already `initialized` by an earlier pass are skipped; failed
    /// ones are retried.
    ///
    /// # Errors
    /// - `NotInitialized` before `bootstrap`. Plugin failures are reported in
    ///   the summary instead.
    pub fn discover_with(
        &self,
        catalog: &PluginCatalog,
        options: &DiscoveryOptions,
    ) -> KernelResult<InitSummary> {
        let bindings = self.bindings()?;
        let _discovery = lock(&self.discovery);
        let mut summary = InitSummary::default();

        info!(
            "event=plugin_discovery module=kernel status=start plugins={}",
            catalog.len()
        );
        for plugin in catalog.iter() {
            let manifest = plugin.manifest();
            let plugin_id = manifest.id.trim().to_string();

            if options.is_disabled(&plugin_id) {
                let mut registry = lock(&self.registry);
                if registry.state_of(&plugin_id).is_none() {
                    registry.upsert(PluginDescriptor::uninitialized(
                        plugin_id.clone(),
                        manifest.version.trim(),
                    ));
                }
                info!("event=plugin_init module=kernel status=skipped plugin={plugin_id} reason=disabled");
                summary.skipped.push(plugin_id);
                continue;
            }
            if lock(&self.registry).state_of(&plugin_id) == Some(PluginState::Initialized) {
                debug!("event=plugin_init module=kernel status=skipped plugin={plugin_id} reason=already_initialized");
                summary.skipped.push(plugin_id);
                continue;
            }

            match self.init_plugin(bindings, plugin, &plugin_id) {
                Ok(()) => summary.initialized.push(plugin_id),
                Err(err) => summary.failed.push(err),
            }
        }
        info!(
            "event=plugin_discovery module=kernel status=ok initialized={} failed={} skipped={}",
            summary.initialized.len(),
            summary.failed.len(),
            summary.skipped.len()
        );
        Ok(summary)
    }

    fn init_plugin(
        &self,
        bindings: &Bindings,
        plugin: &dyn Plugin,
        plugin_id: &str,
    ) -> KernelResult<()> {
        let manifest = plugin.manifest();
        let mut descriptor =
            PluginDescriptor::uninitialized(plugin_id, manifest.version.trim());
        lock(&self.registry).scope = Some(InitScope {
            plugin_id: plugin_id.to_string(),
            thread: thread::current().id(),
            declared: manifest.declared_contributions(),
            points: Vec::new(),
            attached: Vec::new(),
            actions: Vec::new(),
            previous_content: None,
        });
        info!("event=plugin_init module=kernel status=start plugin={plugin_id}");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| plugin.init(self)));
        let scope = lock(&self.registry).scope.take();

        let failure = match outcome {
            Ok(Ok(true)) => None,
            Ok(Ok(false)) => Some("init returned false".to_string()),
            Ok(Err(err)) => Some(err.to_string()),
            Err(payload) => Some(format!(
                "init panicked: {}",
                panic_payload_message(payload.as_ref())
            )),
        };

        match failure {
            None => {
                descriptor.state = PluginState::Initialized;
                descriptor.extension_points =
                    scope.map(|scope| scope.points).unwrap_or_default();
                info!(
                    "event=plugin_init module=kernel status=ok plugin={plugin_id} extension_points={}",
                    descriptor.extension_points.len()
                );
                lock(&self.registry).upsert(descriptor);
                Ok(())
            }
            Some(reason) => {
                if let Some(scope) = scope {
                    self.rollback(bindings, scope);
                }
                error!("event=plugin_init module=kernel status=error plugin={plugin_id} reason={reason}");
                descriptor.state = PluginState::Failed;
                descriptor.failure = Some(reason.clone());
                lock(&self.registry).upsert(descriptor);
                Err(KernelError::PluginInit {
                    plugin_id: plugin_id.to_string(),
                    reason,
                })
            }
        }
    }

    fn rollback(&self, bindings: &Bindings, scope: InitScope) {
        let InitScope {
            plugin_id,
            points,
            attached,
            actions,
            previous_content,
            ..
        } = scope;
        let restored = {
            let mut registry = lock(&self.registry);
            let mut restored = 0;
            for (handle, displaced) in actions.iter().rev() {
                match displaced {
                    Some(previous) => {
                        registry.actions.insert(*handle, previous.clone());
                        restored += 1;
                    }
                    None => {
                        registry.actions.remove(handle);
                    }
                }
            }
            restored
        };

        let mut ui = lock(&bindings.ui);
        for handle in attached.iter().rev() {
            if let Err(err) = ui.detach_menu_item(*handle) {
                warn!("event=plugin_rollback module=kernel status=error plugin={plugin_id} reason={err}");
            }
        }
        for point in points.iter().rev() {
            let result = match point {
                ExtensionPoint::MenuItem(handle) => ui.remove_menu_item(*handle),
                ExtensionPoint::Tab(handle) => ui.close_tab(*handle),
                ExtensionPoint::Content => Ok(()),
            };
            if let Err(err) = result {
                warn!("event=plugin_rollback module=kernel status=error plugin={plugin_id} reason={err}");
            }
        }
        match previous_content {
            Some(Some(content)) => ui.set_content(content),
            Some(None) => ui.clear_content(),
            None => {}
        }
        debug!(
            "event=plugin_rollback module=kernel status=ok plugin={plugin_id} points={} attached={} actions={} restored={restored}",
            points.len(),
            attached.len(),
            actions.len()
        );
    }

    pub(crate) fn check_contribution(&self, kind: Contribution) -> KernelResult<()> {
        let registry = lock(&self.registry);
        match registry.active_scope() {
            Some(scope) if !scope.declared.contains(&kind) => {
                warn!(
                    "event=contribution_denied module=kernel status=error plugin={} contribution={}",
                    scope.plugin_id,
                    kind.as_str()
                );
                Err(KernelError::ContributionDenied {
                    plugin_id: scope.plugin_id.clone(),
                    contribution: kind.as_str(),
                })
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn record_point(&self, point: ExtensionPoint) {
        if let Some(scope) = lock(&self.registry).active_scope_mut() {
            scope.points.push(point);
        }
    }

    /// Records an attach of a menu item the plugin in `init` did not create.
    pub(crate) fn record_attach(&self, handle: MenuItemHandle) {
        if let Some(scope) = lock(&self.registry).active_scope_mut() {
            if !scope.created_menu_item(handle) {
                scope.attached.push(handle);
            }
        }
    }

    /// Remembers the content a plugin replaced, once per `init`.
    pub(crate) fn record_content(&self, previous: Option<Content>) {
        if let Some(scope) = lock(&self.registry).active_scope_mut() {
            if scope.previous_content.is_none() {
                scope.previous_content = Some(previous);
                scope.points.push(ExtensionPoint::Content);
            }
        }
    }

    pub(crate) fn in_init_scope(&self) -> bool {
        lock(&self.registry).active_scope().is_some()
    }

    /// Descriptors of every plugin seen by discovery, in discovery order.
    pub fn plugins(&self) -> Vec<PluginDescriptor> {
        lock(&self.registry).descriptors.clone()
    }

    pub fn plugin(&self, plugin_id: &str) -> Option<PluginDescriptor> {
        let wanted = plugin_id.trim();
        lock(&self.registry)
            .descriptors
            .iter()
            .find(|descriptor| descriptor.id == wanted)
            .cloned()
    }

    /// Runs the action bound to `handle`.
    ///
    /// The handler's `prepare` step runs on the calling thread; its errors
    /// (validation included) are returned here. The prepared task is queued on
    /// the worker and its result is applied by a later `pump_completions`.
    pub fn trigger(&self, handle: MenuItemHandle, request: &ActionRequest) -> KernelResult<JobHandle> {
        let bindings = self.bindings()?;
        let action = lock(&self.registry)
            .actions
            .get(&handle)
            .cloned()
            .ok_or_else(|| KernelError::UnknownAction(handle.to_string()))?;

        let task = action.binding.handler.prepare(request)?;
        let id = Uuid::new_v4();
        let token = CancellationToken::new();
        let tab = match &action.binding.target {
            ActionTarget::NewTab { title } => Some(
                lock(&bindings.ui).create_tab(title, Content::placeholder(PLACEHOLDER_MESSAGE)),
            ),
            ActionTarget::PrimaryContent => None,
        };

        lock(&self.pending).insert(
            id,
            PendingJob {
                plugin_id: action.plugin_id.clone(),
                tab,
                token: token.clone(),
                started_at: Instant::now(),
            },
        );
        let submitted = lock(&bindings.worker).submit(Job {
            id,
            token: token.clone(),
            task,
        });
        if let Err(err) = submitted {
            lock(&self.pending).remove(&id);
            if let Some(tab) = tab {
                let _ = lock(&bindings.ui).close_tab(tab);
            }
            error!(
                "event=action_trigger module=kernel status=error plugin={} reason={err}",
                action.plugin_id
            );
            return Err(err);
        }

        info!(
            "event=action_trigger module=kernel status=ok plugin={} menu_item={handle} job_id={id}",
            action.plugin_id
        );
        Ok(JobHandle::new(id, token, tab))
    }

    /// Looks up a menu item by group and label, then triggers it.
    pub fn trigger_menu(
        &self,
        group: &str,
        label: &str,
        request: &ActionRequest,
    ) -> KernelResult<JobHandle> {
        let bindings = self.bindings()?;
        let handle = lock(&bindings.ui)
            .snapshot()
            .find_menu_item(group, label)
            .ok_or_else(|| KernelError::UnknownAction(format!("{group}/{label}")))?;
        self.trigger(handle, request)
    }

    /// Applies every completion currently queued, then expires overdue jobs.
    ///
    /// Runtime failures become error notifications. Programmer errors
    /// (`Validation`, `NotInitialized`) raised by a task are not notified: after
    /// the queue is drained the first one is returned.
    pub fn pump_completions(&self) -> KernelResult<PumpSummary> {
        let bindings = self.bindings()?;
        let mut summary = PumpSummary::default();
        let mut programmer_error = None;

        loop {
            let next = lock(&bindings.worker).try_next();
            let Some(completion) = next else {
                break;
            };
            if let Some(err) = self.apply_completion(bindings, completion, &mut summary) {
                programmer_error.get_or_insert(err);
            }
        }
        self.expire_overdue(bindings, &mut summary);

        match programmer_error {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }

    fn apply_completion(
        &self,
        bindings: &Bindings,
        completion: Completion,
        summary: &mut PumpSummary,
    ) -> Option<KernelError> {
        let Completion { id, result } = completion;
        let Some(job) = lock(&self.pending).remove(&id) else {
            debug!("event=action_complete module=kernel status=skipped job_id={id} reason=expired");
            return None;
        };

        let cancelled = job.token.is_cancelled() || matches!(result, Err(KernelError::Cancelled));
        let mut ui = lock(&bindings.ui);
        if cancelled {
            if let Some(tab) = job.tab {
                let _ = ui.close_tab(tab);
            }
            debug!(
                "event=action_complete module=kernel status=skipped plugin={} job_id={id} reason=cancelled",
                job.plugin_id
            );
            summary.cancelled += 1;
            return None;
        }

        match result {
            Ok(content) => {
                match job.tab {
                    Some(tab) => {
                        if let Err(err) = ui.update_tab(tab, content) {
                            debug!(
                                "event=action_complete module=kernel status=skipped plugin={} job_id={id} reason={err}",
                                job.plugin_id
                            );
                            summary.cancelled += 1;
                            return None;
                        }
                    }
                    None => ui.set_content(content),
                }
                info!(
                    "event=action_complete module=kernel status=ok plugin={} job_id={id}",
                    job.plugin_id
                );
                summary.applied += 1;
                None
            }
            Err(err) => {
                if let Some(tab) = job.tab {
                    let _ = ui.close_tab(tab);
                }
                summary.failed += 1;
                if err.is_programmer_error() {
                    error!(
                        "event=action_complete module=kernel status=error plugin={} job_id={id} code={} reason={err}",
                        job.plugin_id,
                        err.code()
                    );
                    return Some(err);
                }
                warn!(
                    "event=action_complete module=kernel status=error plugin={} job_id={id} code={} reason={err}",
                    job.plugin_id,
                    err.code()
                );
                ui.notify(Notification::error(
                    format!("{} action failed", job.plugin_id),
                    err.to_string(),
                ));
                None
            }
        }
    }

    fn expire_overdue(&self, bindings: &Bindings, summary: &mut PumpSummary) {
        let Some(limit) = bindings.settings.job_timeout else {
            return;
        };
        let expired: Vec<(JobId, PendingJob)> = {
            let mut pending = lock(&self.pending);
            let overdue: Vec<JobId> = pending
                .iter()
                .filter(|(_, job)| job.started_at.elapsed() > limit)
                .map(|(id, _)| *id)
                .collect();
            overdue
                .into_iter()
                .filter_map(|id| pending.remove(&id).map(|job| (id, job)))
                .collect()
        };

        for (id, job) in expired {
            job.token.cancel();
            let err = KernelError::TimedOut {
                elapsed_ms: job.started_at.elapsed().as_millis(),
            };
            warn!(
                "event=action_complete module=kernel status=error plugin={} job_id={id} code={} reason={err}",
                job.plugin_id,
                err.code()
            );
            let mut ui = lock(&bindings.ui);
            if let Some(tab) = job.tab {
                let _ = ui.close_tab(tab);
            }
            ui.notify(Notification::error(
                format!("{} action failed", job.plugin_id),
                err.to_string(),
            ));
            summary.timed_out += 1;
        }
    }

    /// Pumps until no job is outstanding or `timeout` elapses.
    pub fn wait_for_idle(&self, timeout: Duration) -> KernelResult<PumpSummary> {
        let bindings = self.bindings()?;
        let deadline = Instant::now() + timeout;
        let mut summary = self.pump_completions()?;

        while self.has_pending() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let wait = (deadline - now).min(IDLE_POLL_INTERVAL);
            let next = lock(&bindings.worker).next_timeout(wait);
            if let Some(completion) = next {
                if let Some(err) = self.apply_completion(bindings, completion, &mut summary) {
                    return Err(err);
                }
            }
            summary.merge(self.pump_completions()?);
        }
        Ok(summary)
    }

    /// Closes a tab, cancelling every outstanding job bound to it.
    pub fn close_tab(&self, tab: TabHandle) -> KernelResult<()> {
        let bindings = self.bindings()?;
        for job in lock(&self.pending)
            .values()
            .filter(|job| job.tab == Some(tab))
        {
            job.token.cancel();
        }
        lock(&bindings.ui).close_tab(tab)?;
        Ok(())
    }

    /// Cancels one outstanding job. Returns `false` when it is unknown.
    pub fn cancel_job(&self, id: JobId) -> bool {
        match lock(&self.pending).get(&id) {
            Some(job) => {
                job.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn has_pending(&self) -> bool {
        !lock(&self.pending).is_empty()
    }

    pub fn pending_jobs(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Cancels outstanding jobs and stops the worker.
    pub fn shutdown(&self) {
        let Some(bindings) = self.bound.get() else {
            return;
        };
        let cancelled = {
            let mut pending = lock(&self.pending);
            for job in pending.values() {
                job.token.cancel();
            }
            let count = pending.len();
            pending.clear();
            count
        };
        lock(&bindings.worker).shutdown();
        info!("event=core_shutdown module=kernel status=ok cancelled_jobs={cancelled}");
    }
}

/// Locks `mutex`, recovering the guard when a plugin panicked while holding it.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
