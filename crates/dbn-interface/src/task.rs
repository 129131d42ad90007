//! Interface tasks and the caller-side wait protocol
//!
//! A task is created on the calling thread, executed on a worker picked by
//! the consumer, and, for synchronous requests, waited for by the caller.
//! The caller parks in bounded intervals and is unparked by the worker when
//! the task reaches a terminal status; every wake re-checks cancellation,
//! thread validity and the overall timeout.

use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;
use std::thread::{self, Thread};
use std::time::Instant;

use chrono::{DateTime, Utc};
use dbn_core::{DbnError, Platform, Result, StatusHolder, ThreadKind};
use parking_lot::Mutex;

use crate::queue::QueueConfig;
use crate::{InterfaceTaskRequest, InterfaceTaskStatus};

type Executor<R> = Box<dyn FnOnce() -> Result<R> + Send + 'static>;

/// Where a task came from and whether someone waits for it
#[derive(Debug, Clone)]
pub struct TaskSource {
    synchronous: bool,
    caller: Thread,
    created: Instant,
    created_at: DateTime<Utc>,
}

impl TaskSource {
    /// Capture the calling thread
    pub fn current(synchronous: bool) -> Self {
        Self {
            synchronous,
            caller: thread::current(),
            created: Instant::now(),
            created_at: Utc::now(),
        }
    }

    pub fn is_synchronous(&self) -> bool {
        self.synchronous
    }

    pub fn caller(&self) -> &Thread {
        &self.caller
    }

    /// Monotonic creation instant, used for timeout detection
    pub fn created(&self) -> Instant {
        self.created
    }

    /// Wall-clock creation time, for diagnostics
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Type-erased view of a task, as held by the queue
pub trait ScheduledTask: Send + Sync {
    fn request(&self) -> &InterfaceTaskRequest;

    fn status(&self) -> InterfaceTaskStatus;

    /// Apply a status transition; returns false if it was rejected.
    fn change_status(&self, status: InterfaceTaskStatus) -> bool;

    /// Run the wrapped operation on the current thread, capturing its
    /// outcome. Never panics and never returns the error.
    fn execute(&self);

    /// Mark the task finished and wake the waiting caller
    fn finish(&self) {
        self.change_status(InterfaceTaskStatus::Finished);
    }
}

/// A unit of scheduled database work producing `R`
pub struct InterfaceTask<R> {
    request: InterfaceTaskRequest,
    executor: Mutex<Option<Executor<R>>>,
    status: StatusHolder<InterfaceTaskStatus>,
    response: Mutex<Option<R>>,
    error: Mutex<Option<DbnError>>,
    source: TaskSource,
    started: OnceLock<Instant>,
    scheduled: OnceLock<Instant>,
}

impl<R: Send + 'static> InterfaceTask<R> {
    pub fn new<F>(request: InterfaceTaskRequest, synchronous: bool, executor: F) -> Self
    where
        F: FnOnce() -> Result<R> + Send + 'static,
    {
        Self {
            request,
            executor: Mutex::new(Some(Box::new(executor))),
            status: StatusHolder::new(InterfaceTaskStatus::New),
            response: Mutex::new(None),
            error: Mutex::new(None),
            source: TaskSource::current(synchronous),
            started: OnceLock::new(),
            scheduled: OnceLock::new(),
        }
    }

    pub fn source(&self) -> &TaskSource {
        &self.source
    }

    /// Every status this task held before the current one
    pub fn status_history(&self) -> Vec<InterfaceTaskStatus> {
        self.status.history()
    }

    /// When a worker started executing the task
    pub fn started_at(&self) -> Option<Instant> {
        self.started.get().copied()
    }

    /// When the monitor thread finished handing the task over
    pub fn scheduled_at(&self) -> Option<Instant> {
        self.scheduled.get().copied()
    }

    /// Take the produced value, if any
    pub fn take_response(&self) -> Option<R> {
        self.response.lock().take()
    }

    pub fn has_error(&self) -> bool {
        self.error.lock().is_some()
    }

    fn capture_error(&self, error: DbnError) {
        if self.source.synchronous {
            tracing::debug!(title = %self.request.title(), error = %error, "interface task failed");
        } else {
            tracing::warn!(
                title = %self.request.title(),
                connection_id = %self.request.connection_id(),
                error = %error,
                "background interface task failed"
            );
        }
        let mut slot = self.error.lock();
        if slot.is_none() {
            *slot = Some(error);
        }
    }

    /// Block the calling thread until the task reaches a terminal status.
    ///
    /// Returns the captured error, if any. Returns `Ok(())` without waiting
    /// when called from a thread that must never block, and stops waiting
    /// when the request is cancelled or `config.task_timeout()` has passed
    /// since the task was created.
    pub fn await_completion(&self, config: &QueueConfig, platform: &dyn Platform) -> Result<()> {
        let timeout = config.task_timeout();
        loop {
            if self.status.get().is_terminal() {
                break;
            }

            let thread = ThreadKind::current();
            if thread.forbids_blocking() {
                tracing::error!(
                    title = %self.request.title(),
                    thread = ?thread,
                    "synchronous interface task invoked from illegal thread, not waiting"
                );
                break;
            }

            if self.request.is_cancelled() {
                tracing::debug!(title = %self.request.title(), "caller cancelled, not waiting");
                break;
            }

            let elapsed = self.source.created.elapsed();
            if elapsed >= timeout {
                tracing::warn!(
                    title = %self.request.title(),
                    timeout_ms = timeout.as_millis() as u64,
                    "interface task timed out"
                );
                self.capture_error(DbnError::Timeout(format!(
                    "operation '{}' did not complete within {:?}",
                    self.request.title(),
                    timeout
                )));
                break;
            }

            let interval = if platform.is_modal_active() {
                config.modal_wait_interval()
            } else {
                config.caller_wait_interval()
            };
            thread::park_timeout(interval.min(timeout - elapsed));
        }

        match self.error.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl<R: Send + 'static> ScheduledTask for InterfaceTask<R> {
    fn request(&self) -> &InterfaceTaskRequest {
        &self.request
    }

    fn status(&self) -> InterfaceTaskStatus {
        self.status.get()
    }

    fn change_status(&self, status: InterfaceTaskStatus) -> bool {
        match status {
            InterfaceTaskStatus::Started => {
                let _ = self.started.set(Instant::now());
            }
            InterfaceTaskStatus::Scheduled => {
                let _ = self.scheduled.set(Instant::now());
            }
            _ => {}
        }

        let changed = self.status.change(status);
        if changed {
            tracing::trace!(title = %self.request.title(), status = ?status, "task status changed");
            if status.is_terminal() && self.source.synchronous {
                self.source.caller.unpark();
            }
        }
        changed
    }

    fn execute(&self) {
        self.change_status(InterfaceTaskStatus::Started);

        let Some(executor) = self.executor.lock().take() else {
            return;
        };

        match panic::catch_unwind(AssertUnwindSafe(executor)) {
            Ok(Ok(response)) => *self.response.lock() = Some(response),
            Ok(Err(error)) => self.capture_error(error),
            Err(payload) => self.capture_error(DbnError::from_panic(payload)),
        }
    }
}
