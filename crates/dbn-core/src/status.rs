//! Monotonic status tracking
//!
//! A [`StatusHolder`] only ever moves forward along the total order defined
//! by its status type. Attempts to move sideways or backwards are ignored,
//! which keeps duplicate or late signals (a second completion, a re-queue of
//! a finished task) from corrupting the recorded state.

use std::fmt::Debug;

use parking_lot::RwLock;

/// A status type with a total order
pub trait Status: Copy + Eq + Debug + Send + Sync + 'static {
    /// Position of this status in the total order
    fn ordinal(self) -> u8;

    fn is_after(self, other: Self) -> bool {
        self.ordinal() > other.ordinal()
    }

    fn is_before(self, other: Self) -> bool {
        self.ordinal() < other.ordinal()
    }
}

#[derive(Debug)]
struct StatusState<T> {
    current: T,
    history: Vec<T>,
}

/// Lock-guarded status cell that records every status it held
#[derive(Debug)]
pub struct StatusHolder<T: Status> {
    state: RwLock<StatusState<T>>,
}

impl<T: Status> StatusHolder<T> {
    pub fn new(initial: T) -> Self {
        Self {
            state: RwLock::new(StatusState {
                current: initial,
                history: Vec::new(),
            }),
        }
    }

    /// Move to `status` if it comes after the current one.
    ///
    /// Returns false, leaving the state untouched, otherwise.
    pub fn change(&self, status: T) -> bool {
        let mut state = self.state.write();
        if !status.is_after(state.current) {
            return false;
        }
        let previous = state.current;
        state.history.push(previous);
        state.current = status;
        true
    }

    pub fn get(&self) -> T {
        self.state.read().current
    }

    pub fn is(&self, status: T) -> bool {
        self.get() == status
    }

    /// Whether the current status comes before `status`
    pub fn is_before(&self, status: T) -> bool {
        self.get().is_before(status)
    }

    /// Whether the current status comes after `status`
    pub fn is_after(&self, status: T) -> bool {
        self.get().is_after(status)
    }

    /// Previously held statuses, oldest first
    pub fn history(&self) -> Vec<T> {
        self.state.read().history.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::thread;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Phase {
        Idle,
        Running,
        Done,
    }

    impl Status for Phase {
        fn ordinal(self) -> u8 {
            self as u8
        }
    }

    #[test]
    fn test_forward_transition_commits() {
        let holder = StatusHolder::new(Phase::Idle);
        assert!(holder.change(Phase::Running));
        assert_eq!(holder.get(), Phase::Running);
        assert!(holder.is(Phase::Running));
        assert!(holder.is_before(Phase::Done));
        assert!(holder.is_after(Phase::Idle));
    }

    #[test]
    fn test_backward_and_same_transitions_are_ignored() {
        let holder = StatusHolder::new(Phase::Idle);
        assert!(holder.change(Phase::Done));

        assert!(!holder.change(Phase::Running));
        assert!(!holder.change(Phase::Done));
        assert_eq!(holder.get(), Phase::Done);
    }

    #[test]
    fn test_skipping_statuses_is_allowed() {
        let holder = StatusHolder::new(Phase::Idle);
        assert!(holder.change(Phase::Done));
        assert_eq!(holder.history(), vec![Phase::Idle]);
    }

    #[test]
    fn test_history_keeps_push_order() {
        let holder = StatusHolder::new(Phase::Idle);
        holder.change(Phase::Running);
        holder.change(Phase::Idle);
        holder.change(Phase::Done);
        assert_eq!(holder.history(), vec![Phase::Idle, Phase::Running]);
    }

    #[test]
    fn test_concurrent_changes_commit_once() {
        let holder = Arc::new(StatusHolder::new(Phase::Idle));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let holder = holder.clone();
                thread::spawn(move || holder.change(Phase::Done))
            })
            .collect();

        let committed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|changed| *changed)
            .count();
        assert_eq!(committed, 1);
        assert_eq!(holder.history(), vec![Phase::Idle]);
    }
}
