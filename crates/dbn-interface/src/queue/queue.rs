//! Interface queue implementation

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::thread::{self, JoinHandle, Thread};

use dbn_core::{ConnectionContext, ConnectionId, DbnError, Platform, Result};
use parking_lot::{Condvar, Mutex};

use super::config::QueueConfig;
use super::counters::{InterfaceCounters, QueueStats};
use crate::consumer::InterfaceQueueConsumer;
use crate::{
    InterfaceTask, InterfaceTaskRequest, InterfaceTaskStatus, InterfaceThreadMonitor,
    ScheduledTask, TaskPriority,
};

/// Pending task with its position in the priority order
struct QueueEntry {
    priority: TaskPriority,
    sequence: u64,
    task: Arc<dyn ScheduledTask>,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // Higher priority first, then arrival order within a priority
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// State shared between the queue handle, its monitor thread and the workers
pub(crate) struct QueueShared {
    connection: Weak<dyn ConnectionContext>,
    connection_id: ConnectionId,
    connection_name: String,
    config: QueueConfig,
    platform: Arc<dyn Platform>,
    thread_monitor: Arc<InterfaceThreadMonitor>,
    consumer: InterfaceQueueConsumer,
    pending: Mutex<BinaryHeap<QueueEntry>>,
    available: Condvar,
    sequence: AtomicU64,
    counters: InterfaceCounters,
    disposed: AtomicBool,
    monitor_thread: OnceLock<Thread>,
}

impl QueueShared {
    pub(crate) fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub(crate) fn connection_name(&self) -> &str {
        &self.connection_name
    }

    pub(crate) fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub(crate) fn thread_monitor(&self) -> &InterfaceThreadMonitor {
        &self.thread_monitor
    }

    fn max_active_tasks(&self) -> usize {
        match self.connection.upgrade() {
            Some(connection) if !connection.is_disposed() => connection.max_pool_size().max(1),
            _ => self.config.fallback_max_active_tasks(),
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn unpark_monitor(&self) {
        if let Some(monitor) = self.monitor_thread.get() {
            monitor.unpark();
        }
    }

    fn push(&self, task: Arc<dyn ScheduledTask>) -> Result<()> {
        let mut pending = self.pending.lock();
        if self.is_disposed() {
            return Err(DbnError::Disposed(format!(
                "interface queue of connection '{}'",
                self.connection_name
            )));
        }
        task.change_status(InterfaceTaskStatus::Queued);
        pending.push(QueueEntry {
            priority: task.request().priority(),
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            task,
        });
        self.counters.task_queued();
        drop(pending);

        self.available.notify_one();
        Ok(())
    }

    /// Block until a task is available; `None` once the queue is disposed
    fn take(&self) -> Option<Arc<dyn ScheduledTask>> {
        let mut pending = self.pending.lock();
        loop {
            if self.is_disposed() {
                return None;
            }
            if let Some(entry) = pending.pop() {
                return Some(entry.task);
            }
            self.available.wait(&mut pending);
        }
    }

    fn monitor_loop(self: Arc<Self>) {
        let _ = self.monitor_thread.set(thread::current());
        tracing::debug!(connection = %self.connection_name, "interface queue monitor started");

        while !self.is_disposed() {
            while self.counters.running() >= self.max_active_tasks() && !self.is_disposed() {
                thread::park();
            }

            let Some(task) = self.take() else {
                break;
            };

            let running = self.counters.task_dequeued();
            let max_active = self.max_active_tasks();
            if running > max_active {
                tracing::warn!(
                    connection = %self.connection_name,
                    running,
                    max_active,
                    "interface queue running more tasks than allowed"
                );
            }

            task.change_status(InterfaceTaskStatus::Dequeued);
            self.consumer.accept(task.clone(), &self);
            task.change_status(InterfaceTaskStatus::Scheduled);
        }

        tracing::debug!(connection = %self.connection_name, "interface queue monitor stopped");
    }

    /// Run a dequeued task on the current worker thread
    pub(crate) fn execute_task(&self, task: Arc<dyn ScheduledTask>, progress: bool) {
        let _bracket = ExecutionBracket {
            queue: self,
            task: task.as_ref(),
            progress,
        };
        task.execute();
    }
}

/// Accounting that has to run however the task body ends
struct ExecutionBracket<'a> {
    queue: &'a QueueShared,
    task: &'a dyn ScheduledTask,
    progress: bool,
}

impl Drop for ExecutionBracket<'_> {
    fn drop(&mut self) {
        let running = self.queue.counters.task_finished();
        self.queue.thread_monitor.finish(self.progress);
        self.task.finish();
        if running < self.queue.max_active_tasks() {
            self.queue.unpark_monitor();
        }
    }
}

/// Priority queue of database work for one connection
pub struct InterfaceQueue {
    shared: Arc<QueueShared>,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl InterfaceQueue {
    /// Create the queue of `connection` and start its monitor thread
    pub fn new(
        connection: &Arc<dyn ConnectionContext>,
        platform: Arc<dyn Platform>,
        thread_monitor: Arc<InterfaceThreadMonitor>,
        config: QueueConfig,
    ) -> Result<Self> {
        let consumer = InterfaceQueueConsumer::new(config.max_progress_tasks());
        let shared = Arc::new(QueueShared {
            connection: Arc::downgrade(connection),
            connection_id: connection.id(),
            connection_name: connection.name(),
            config,
            platform,
            thread_monitor,
            consumer,
            pending: Mutex::new(BinaryHeap::new()),
            available: Condvar::new(),
            sequence: AtomicU64::new(0),
            counters: InterfaceCounters::default(),
            disposed: AtomicBool::new(false),
            monitor_thread: OnceLock::new(),
        });

        let monitor = thread::Builder::new()
            .name(format!("DBN - Interface Queue ({})", shared.connection_name))
            .spawn({
                let shared = shared.clone();
                move || shared.monitor_loop()
            })?;

        tracing::info!(
            connection_id = %shared.connection_id,
            connection = %shared.connection_name,
            "interface queue created"
        );

        Ok(Self {
            shared,
            monitor: Mutex::new(Some(monitor)),
        })
    }

    /// Run `executor` through the queue and return its value.
    ///
    /// Blocks the calling thread until the task finishes, the caller's
    /// request is cancelled, or the configured timeout passes.
    pub fn schedule_and_return<R, F>(&self, request: InterfaceTaskRequest, executor: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce() -> Result<R> + Send + 'static,
    {
        let task = self.queue(request, true, executor)?;
        task.take_response().ok_or_else(|| {
            if task.status() == InterfaceTaskStatus::Cancelled || task.request().is_cancelled() {
                DbnError::Cancelled
            } else {
                DbnError::NoResponse(format!(
                    "operation '{}' returned without a result",
                    task.request().title()
                ))
            }
        })
    }

    /// Run `executor` through the queue, blocking until it finishes
    pub fn schedule_and_wait<F>(&self, request: InterfaceTaskRequest, executor: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.queue(request, true, executor).map(|_| ())
    }

    /// Enqueue `executor` without waiting; failures are only logged
    pub fn schedule_and_forget<F>(&self, request: InterfaceTaskRequest, executor: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.queue(request, false, executor).map(|_| ())
    }

    pub(super) fn queue<R, F>(
        &self,
        request: InterfaceTaskRequest,
        synchronous: bool,
        executor: F,
    ) -> Result<Arc<InterfaceTask<R>>>
    where
        R: Send + 'static,
        F: FnOnce() -> Result<R> + Send + 'static,
    {
        let task = Arc::new(InterfaceTask::new(request, synchronous, executor));
        tracing::trace!(
            title = %task.request().title(),
            priority = ?task.request().priority(),
            synchronous,
            "queueing interface task"
        );
        self.shared.push(task.clone())?;

        if !synchronous {
            return Ok(task);
        }

        let result = task
            .await_completion(&self.shared.config, self.shared.platform.as_ref())
            .and_then(|()| match task.status() {
                InterfaceTaskStatus::Cancelled => Err(DbnError::Cancelled),
                _ => Ok(()),
            });
        task.change_status(InterfaceTaskStatus::Released);
        result.map(|()| task)
    }

    /// Number of tasks waiting to be dequeued
    pub fn size(&self) -> usize {
        self.shared.pending.lock().len()
    }

    /// Current concurrency cap, read from the connection's pool size
    pub fn max_active_tasks(&self) -> usize {
        self.shared.max_active_tasks()
    }

    pub fn counters(&self) -> &InterfaceCounters {
        &self.shared.counters
    }

    pub fn stats(&self) -> QueueStats {
        self.shared.counters.snapshot(self.max_active_tasks())
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.shared.connection_id
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.is_disposed()
    }

    /// Cancel all pending tasks and stop the monitor thread.
    ///
    /// Tasks already handed to a worker keep running to completion.
    #[tracing::instrument(skip(self), fields(connection = %self.shared.connection_name))]
    pub fn dispose(&self) {
        let cancelled: Vec<QueueEntry> = {
            let mut pending = self.shared.pending.lock();
            if self.shared.disposed.swap(true, Ordering::SeqCst) {
                return;
            }
            pending.drain().collect()
        };
        self.shared.available.notify_all();

        for entry in &cancelled {
            entry.task.change_status(InterfaceTaskStatus::Cancelled);
        }
        self.shared.counters.reset_queued();
        self.shared.unpark_monitor();

        if let Some(monitor) = self.monitor.lock().take()
            && monitor.thread().id() != thread::current().id()
            && monitor.join().is_err()
        {
            tracing::error!("interface queue monitor panicked");
        }

        tracing::info!(cancelled = cancelled.len(), "interface queue disposed");
    }
}

impl Drop for InterfaceQueue {
    fn drop(&mut self) {
        self.dispose();
    }
}
