//! Worker thread executing action tasks off the UI thread.
//!
//! # Invariants
//! - The worker owns the `FleetStore`; no other thread touches it.
//! - Jobs run one at a time in submission order.
//! - Every submitted job produces exactly one completion, including cancelled
//!   and panicking jobs.
//! - Completions have a single consumer: the thread pumping the core.

use crate::error::{KernelError, KernelResult};
use crate::kernel::dispatch::{cancelled_result, Completion, Job};
use crate::logging::panic_payload_message;
use crate::repo::fleet_store::FleetStore;
use log::{debug, error, info};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const WORKER_THREAD_NAME: &str = "fleetkernel-worker";

/// Handle to the background worker and its completion queue.
pub struct TaskWorker {
    jobs: Option<Sender<Job>>,
    completions: Receiver<Completion>,
    thread: Option<JoinHandle<()>>,
}

impl TaskWorker {
    /// Starts the worker thread, moving `store` onto it.
    pub fn spawn(store: Box<dyn FleetStore>) -> KernelResult<Self> {
        let (jobs_tx, jobs_rx) = mpsc::channel::<Job>();
        let (completions_tx, completions_rx) = mpsc::channel::<Completion>();

        let thread = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(store, jobs_rx, completions_tx))
            .map_err(|err| KernelError::WorkerUnavailable(err.to_string()))?;

        info!("event=worker_start module=kernel status=ok thread={WORKER_THREAD_NAME}");
        Ok(Self {
            jobs: Some(jobs_tx),
            completions: completions_rx,
            thread: Some(thread),
        })
    }

    pub(crate) fn submit(&self, job: Job) -> KernelResult<()> {
        let sender = self
            .jobs
            .as_ref()
            .ok_or_else(|| KernelError::WorkerUnavailable("worker was shut down".to_string()))?;
        sender
            .send(job)
            .map_err(|_| KernelError::WorkerUnavailable("worker thread exited".to_string()))
    }

    pub(crate) fn try_next(&self) -> Option<Completion> {
        self.completions.try_recv().ok()
    }

    pub(crate) fn next_timeout(&self, timeout: Duration) -> Option<Completion> {
        match self.completions.recv_timeout(timeout) {
            Ok(completion) => Some(completion),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.jobs.is_some()
    }

    /// Stops accepting jobs and waits for the queued ones to finish.
    pub fn shutdown(&mut self) {
        self.jobs.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("event=worker_stop module=kernel status=error reason=thread_panicked");
                return;
            }
            info!("event=worker_stop module=kernel status=ok");
        }
    }
}

impl Drop for TaskWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(
    mut store: Box<dyn FleetStore>,
    jobs: Receiver<Job>,
    completions: Sender<Completion>,
) {
    for job in jobs {
        let Job { id, token, task } = job;
        let result = if token.is_cancelled() {
            debug!("event=job_run module=kernel status=skipped job_id={id} reason=cancelled");
            cancelled_result()
        } else {
            match panic::catch_unwind(AssertUnwindSafe(|| task(store.as_mut(), &token))) {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_payload_message(payload.as_ref());
                    error!("event=job_run module=kernel status=error job_id={id} panic={message}");
                    Err(KernelError::ActionFailed(format!("action panicked: {message}")))
                }
            }
        };

        if completions.send(Completion { id, result }).is_err() {
            debug!("event=job_run module=kernel status=skipped job_id={id} reason=no_consumer");
            break;
        }
    }
}
