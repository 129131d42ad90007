//! Process-wide interface thread accounting
//!
//! Counts interface tasks running under a progress indicator separately from
//! silent background ones. The progress count is what keeps the consumer
//! from flooding the host with progress indicators across all connections.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
struct ThreadCounters {
    running: AtomicUsize,
    peak: AtomicUsize,
    finished: AtomicUsize,
}

impl ThreadCounters {
    fn start(&self) {
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
    }

    fn try_start(&self, limit: usize) -> bool {
        let mut current = self.running.load(Ordering::SeqCst);
        loop {
            if current >= limit {
                return false;
            }
            match self.running.compare_exchange_weak(
                current,
                current + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    self.peak.fetch_max(current + 1, Ordering::SeqCst);
                    return true;
                }
                Err(actual) => current = actual,
            }
        }
    }

    fn finish(&self) {
        let _ = self
            .running
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

/// Running/peak/finished interface threads, split by execution mode
#[derive(Debug, Default)]
pub struct InterfaceThreadMonitor {
    progress: ThreadCounters,
    background: ThreadCounters,
}

impl InterfaceThreadMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lazily created instance shared by every queue in the process
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<InterfaceThreadMonitor>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(Self::new())).clone()
    }

    fn counters(&self, progress: bool) -> &ThreadCounters {
        if progress {
            &self.progress
        } else {
            &self.background
        }
    }

    pub fn start(&self, progress: bool) {
        self.counters(progress).start();
    }

    /// Start a progress thread unless `limit` progress threads already run.
    pub fn try_start_progress(&self, limit: usize) -> bool {
        self.progress.try_start(limit)
    }

    pub fn finish(&self, progress: bool) {
        self.counters(progress).finish();
    }

    pub fn running_thread_count(&self, progress: bool) -> usize {
        self.counters(progress).running.load(Ordering::SeqCst)
    }

    pub fn peak_thread_count(&self, progress: bool) -> usize {
        self.counters(progress).peak.load(Ordering::SeqCst)
    }

    pub fn finished_thread_count(&self, progress: bool) -> usize {
        self.counters(progress).finished.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> ThreadMonitorStats {
        ThreadMonitorStats {
            progress_running: self.running_thread_count(true),
            progress_peak: self.peak_thread_count(true),
            progress_finished: self.finished_thread_count(true),
            background_running: self.running_thread_count(false),
            background_peak: self.peak_thread_count(false),
            background_finished: self.finished_thread_count(false),
        }
    }
}

/// Snapshot of [`InterfaceThreadMonitor`] counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThreadMonitorStats {
    pub progress_running: usize,
    pub progress_peak: usize,
    pub progress_finished: usize,
    pub background_running: usize,
    pub background_peak: usize,
    pub background_finished: usize,
}
