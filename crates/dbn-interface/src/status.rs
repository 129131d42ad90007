//! Lifecycle of an interface task

use dbn_core::Status;
use serde::{Deserialize, Serialize};

/// Status of an interface task, in lifecycle order
///
/// `Started` is set by the worker and `Scheduled` by the monitor thread once
/// dispatch returns; the two race, so either may be observed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceTaskStatus {
    New,
    Queued,
    Dequeued,
    Started,
    Scheduled,
    Finished,
    Released,
    Cancelled,
}

impl InterfaceTaskStatus {
    /// Statuses from which a waiting caller may stop waiting
    pub fn is_terminal(self) -> bool {
        self >= InterfaceTaskStatus::Finished
    }
}

impl Status for InterfaceTaskStatus {
    fn ordinal(self) -> u8 {
        self as u8
    }
}
