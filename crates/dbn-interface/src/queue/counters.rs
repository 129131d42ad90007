//! Queue counters and statistics

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// Thread-safe queued/running/finished counters of one queue
///
/// Incremented and decremented from the enqueueing threads, the monitor
/// thread and the workers.
#[derive(Debug, Default)]
pub struct InterfaceCounters {
    queued: AtomicUsize,
    running: AtomicUsize,
    finished: AtomicUsize,
}

fn decrement(counter: &AtomicUsize) -> usize {
    match counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)) {
        Ok(previous) => previous - 1,
        Err(_) => 0,
    }
}

impl InterfaceCounters {
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub(crate) fn task_queued(&self) {
        self.queued.fetch_add(1, Ordering::SeqCst);
    }

    /// Move one task from queued to running; returns the new running count
    pub(crate) fn task_dequeued(&self) -> usize {
        decrement(&self.queued);
        self.running.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Move one task from running to finished; returns the new running count
    pub(crate) fn task_finished(&self) -> usize {
        self.finished.fetch_add(1, Ordering::SeqCst);
        decrement(&self.running)
    }

    pub(crate) fn reset_queued(&self) {
        self.queued.store(0, Ordering::SeqCst);
    }

    pub fn snapshot(&self, max_active: usize) -> QueueStats {
        QueueStats::new(self.queued(), self.running(), self.finished(), max_active)
    }
}

/// Statistics about a queue's current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Tasks waiting to be dequeued
    queued: usize,
    /// Tasks dequeued and not yet finished
    running: usize,
    /// Tasks finished since the queue was created
    finished: usize,
    /// Current concurrency cap
    max_active: usize,
}

impl QueueStats {
    pub fn new(queued: usize, running: usize, finished: usize, max_active: usize) -> Self {
        Self {
            queued,
            running,
            finished,
            max_active,
        }
    }

    pub fn queued(&self) -> usize {
        self.queued
    }

    pub fn running(&self) -> usize {
        self.running
    }

    pub fn finished(&self) -> usize {
        self.finished
    }

    pub fn max_active(&self) -> usize {
        self.max_active
    }

    /// Fraction of the concurrency cap in use (0.0 to 1.0, may exceed 1.0
    /// transiently when the cap was lowered)
    pub fn utilization(&self) -> f64 {
        if self.max_active == 0 {
            0.0
        } else {
            self.running as f64 / self.max_active as f64
        }
    }

    /// Whether new tasks have to wait for a running one to finish
    pub fn is_saturated(&self) -> bool {
        self.running >= self.max_active
    }
}

impl Default for QueueStats {
    fn default() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_task_lifecycle_counts() {
        let counters = InterfaceCounters::default();
        counters.task_queued();
        counters.task_queued();
        assert_eq!(counters.task_dequeued(), 1);
        assert_eq!(counters.queued(), 1);

        assert_eq!(counters.task_finished(), 0);
        assert_eq!(counters.finished(), 1);

        counters.reset_queued();
        assert_eq!(counters.snapshot(2), QueueStats::new(0, 0, 1, 2));
    }

    #[test]
    fn test_utilization() {
        assert_eq!(QueueStats::new(0, 1, 0, 4).utilization(), 0.25);
        assert_eq!(QueueStats::default().utilization(), 0.0);
        assert!(QueueStats::new(3, 2, 0, 2).is_saturated());
    }

    #[test]
    fn test_stats_serialize() {
        let json = serde_json::to_value(QueueStats::new(1, 2, 3, 4)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "queued": 1, "running": 2, "finished": 3, "max_active": 4 })
        );
    }
}
