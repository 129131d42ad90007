//! Host platform services
//!
//! The scheduling layer never spawns worker threads for task bodies itself;
//! it hands them to a [`Platform`], which decides where they run and whether
//! a progress indicator is shown. [`TokioPlatform`] is the default host,
//! backed by the blocking pool of a private tokio runtime.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::runtime::{Builder, Runtime};

use crate::{ConnectionId, Result, ThreadKind};

/// A unit of work handed to the platform
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Display information for work running under a visible progress indicator
#[derive(Debug, Clone, Default)]
pub struct ProgressSpec {
    pub title: String,
    pub text: String,
    pub connection_id: Option<ConnectionId>,
    pub connection_name: Option<String>,
}

/// Worker submission services offered by the host
pub trait Platform: Send + Sync {
    /// Whether the host is currently showing a modal progress dialog
    fn is_modal_active(&self) -> bool;

    /// Run `job` silently on a background worker
    fn run_in_background(&self, title: &str, job: Job);

    /// Run `job` on a worker under a visible progress indicator
    fn run_with_progress(&self, progress: ProgressSpec, job: Job);
}

/// Platform backed by a tokio runtime's blocking thread pool
pub struct TokioPlatform {
    runtime: Option<Runtime>,
    modal_active: AtomicBool,
}

impl TokioPlatform {
    /// Default upper bound on concurrently running worker threads
    pub const DEFAULT_MAX_WORKERS: usize = 64;

    pub fn new() -> Result<Self> {
        Self::with_max_workers(Self::DEFAULT_MAX_WORKERS)
    }

    /// Create a platform whose blocking pool holds at most `max_workers` threads
    pub fn with_max_workers(max_workers: usize) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(max_workers.max(1))
            .thread_name("dbn-worker")
            .enable_all()
            .build()?;

        tracing::debug!(max_workers, "platform runtime started");
        Ok(Self {
            runtime: Some(runtime),
            modal_active: AtomicBool::new(false),
        })
    }

    /// Flag a modal progress dialog as shown or hidden
    pub fn set_modal_active(&self, active: bool) {
        self.modal_active.store(active, Ordering::SeqCst);
    }

    fn spawn(&self, kind: ThreadKind, span: tracing::Span, job: Job) {
        let Some(runtime) = self.runtime.as_ref() else {
            tracing::warn!("platform already shut down, job dropped");
            return;
        };
        runtime.spawn_blocking(move || {
            let _kind = kind.enter();
            let _entered = span.enter();
            job();
        });
    }
}

impl Platform for TokioPlatform {
    fn is_modal_active(&self) -> bool {
        self.modal_active.load(Ordering::SeqCst)
    }

    fn run_in_background(&self, title: &str, job: Job) {
        let span = tracing::debug_span!("background", title = %title);
        self.spawn(ThreadKind::Background, span, job);
    }

    fn run_with_progress(&self, progress: ProgressSpec, job: Job) {
        let span = tracing::info_span!(
            "progress",
            title = %progress.title,
            text = %progress.text,
            connection = progress.connection_name.as_deref().unwrap_or(""),
        );
        self.spawn(ThreadKind::Progress, span, job);
    }
}

impl Drop for TokioPlatform {
    fn drop(&mut self) {
        // Workers stuck in a database call must not hold up shutdown.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
