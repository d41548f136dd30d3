//! Action bindings and the job types exchanged with the worker.
//!
//! A menu item is bound to an `ActionBinding`. Triggering it runs the
//! handler's `prepare` step on the calling (UI) thread, which validates the
//! request and returns a `Task`. The task runs on the worker thread against the
//! `FleetStore`; its result comes back as a `Completion` and is applied by
//! `Core::pump_completions`.

use crate::error::{KernelError, KernelResult};
use crate::kernel::cancel::CancellationToken;
use crate::model::validation::ValidationError;
use crate::repo::fleet_store::FleetStore;
use crate::ui::{Content, TabHandle};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Identity of one submitted job.
pub type JobId = Uuid;

pub type TaskResult = KernelResult<Content>;

/// Deferred work executed on the worker thread.
pub type Task = Box<dyn FnOnce(&mut dyn FleetStore, &CancellationToken) -> TaskResult + Send>;

/// Boxes a closure as a `Task`.
pub fn task<F>(work: F) -> Task
where
    F: FnOnce(&mut dyn FleetStore, &CancellationToken) -> TaskResult + Send + 'static,
{
    Box::new(work)
}

/// String fields supplied with a triggered action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionRequest {
    fields: BTreeMap<String, String>,
}

impl ActionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Returns a trimmed, non-empty field.
    pub fn require(&self, key: &str) -> Result<&str, ValidationError> {
        match self.get(key).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ValidationError::MissingField(key.to_string())),
        }
    }

    /// Parses a required field.
    pub fn parse<T: FromStr>(&self, key: &str) -> Result<T, ValidationError> {
        let raw = self.require(key)?;
        raw.parse::<T>().map_err(|_| ValidationError::InvalidField {
            field: key.to_string(),
            value: raw.to_string(),
        })
    }

    /// Parses a required `YYYY-MM-DD` date field.
    pub fn parse_date(&self, key: &str) -> Result<NaiveDate, ValidationError> {
        self.parse::<NaiveDate>(key)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ActionRequest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Where a successful result is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionTarget {
    /// `set_content` on the primary panel.
    PrimaryContent,
    /// A new tab opened at trigger time with a placeholder.
    NewTab { title: String },
}

/// Synchronous half of an action: validates the request and builds the task.
pub trait ActionHandler: Send + Sync {
    fn prepare(&self, request: &ActionRequest) -> KernelResult<Task>;
}

struct FnHandler<F>(F);

impl<F> ActionHandler for FnHandler<F>
where
    F: Fn(&ActionRequest) -> KernelResult<Task> + Send + Sync,
{
    fn prepare(&self, request: &ActionRequest) -> KernelResult<Task> {
        (self.0)(request)
    }
}

/// Action bound to one menu item.
#[derive(Clone)]
pub struct ActionBinding {
    pub target: ActionTarget,
    pub handler: Arc<dyn ActionHandler>,
}

impl ActionBinding {
    pub fn new(target: ActionTarget, handler: Arc<dyn ActionHandler>) -> Self {
        Self { target, handler }
    }

    pub fn primary_content<F>(prepare: F) -> Self
    where
        F: Fn(&ActionRequest) -> KernelResult<Task> + Send + Sync + 'static,
    {
        Self::new(ActionTarget::PrimaryContent, Arc::new(FnHandler(prepare)))
    }

    pub fn new_tab<F>(title: impl Into<String>, prepare: F) -> Self
    where
        F: Fn(&ActionRequest) -> KernelResult<Task> + Send + Sync + 'static,
    {
        Self::new(
            ActionTarget::NewTab {
                title: title.into(),
            },
            Arc::new(FnHandler(prepare)),
        )
    }
}

/// Caller-side handle of a submitted job.
#[derive(Debug, Clone)]
pub struct JobHandle {
    id: JobId,
    token: CancellationToken,
    tab: Option<TabHandle>,
}

impl JobHandle {
    pub(crate) fn new(id: JobId, token: CancellationToken, tab: Option<TabHandle>) -> Self {
        Self { id, token, tab }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// Placeholder tab showing this job's result, if any.
    pub fn tab(&self) -> Option<TabHandle> {
        self.tab
    }

    /// Requests cancellation; the result is discarded when it arrives.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

pub(crate) struct Job {
    pub id: JobId,
    pub token: CancellationToken,
    pub task: Task,
}

pub(crate) struct Completion {
    pub id: JobId,
    pub result: TaskResult,
}

/// Counters returned by one completion pump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpSummary {
    pub applied: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub timed_out: usize,
}

impl PumpSummary {
    pub(crate) fn merge(&mut self, other: PumpSummary) {
        self.applied += other.applied;
        self.failed += other.failed;
        self.cancelled += other.cancelled;
        self.timed_out += other.timed_out;
    }
}

pub(crate) fn cancelled_result() -> TaskResult {
    Err(KernelError::Cancelled)
}
