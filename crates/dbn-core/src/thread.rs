//! Classification of the current thread
//!
//! The host tags the threads it owns (UI dispatch, read/write action,
//! progress and background workers). Code that would block or load
//! synchronously checks the tag first.

use std::cell::Cell;

/// Kind of work the current thread is doing on behalf of the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThreadKind {
    /// A thread the host never classified
    #[default]
    Unclassified,
    /// The UI event dispatch thread
    Dispatch,
    /// A thread holding the host's write lock
    WriteAction,
    /// A thread holding the host's read lock
    ReadAction,
    /// A worker running under a visible progress indicator
    Progress,
    /// A silent background worker
    Background,
}

thread_local! {
    static CURRENT: Cell<ThreadKind> = const { Cell::new(ThreadKind::Unclassified) };
}

impl ThreadKind {
    /// Kind of the calling thread
    pub fn current() -> Self {
        CURRENT.with(Cell::get)
    }

    /// Tag the calling thread until the returned guard is dropped
    #[must_use = "the thread kind is reset when the guard is dropped"]
    pub fn enter(self) -> ThreadKindGuard {
        let previous = CURRENT.with(|current| current.replace(self));
        ThreadKindGuard { previous }
    }

    /// Threads that must never park waiting for database work
    pub fn forbids_blocking(self) -> bool {
        matches!(
            self,
            ThreadKind::Dispatch | ThreadKind::WriteAction | ThreadKind::ReadAction
        )
    }

    /// Threads on which loading metadata synchronously is acceptable
    pub fn allows_sync_load(self) -> bool {
        !self.forbids_blocking()
    }
}

/// Restores the previous thread kind on drop
#[derive(Debug)]
pub struct ThreadKindGuard {
    previous: ThreadKind,
}

impl Drop for ThreadKindGuard {
    fn drop(&mut self) {
        CURRENT.with(|current| current.set(self.previous));
    }
}
