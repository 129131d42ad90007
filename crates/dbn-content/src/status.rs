//! Content status flags

use std::sync::atomic::{AtomicU16, Ordering};

bitflags::bitflags! {
    /// Lifecycle and property flags of a dynamic content
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContentFlags: u16 {
        /// Elements were loaded at least once
        const LOADED = 1;
        /// A load is executing
        const LOADING = 1 << 1;
        /// A background load was submitted and has not finished
        const LOADING_IN_BACKGROUND = 1 << 2;
        /// Elements are stale and should be reloaded on next access
        const DIRTY = 1 << 3;
        /// The last load failed with an unsupported feature
        const ERROR = 1 << 4;
        /// This content owns its elements and disposes them
        const MASTER = 1 << 5;
        /// Elements are not presented to the user, filters do not apply
        const INTERNAL = 1 << 6;
        /// Elements are derived in memory, filters do not apply
        const VIRTUAL = 1 << 7;
        const DISPOSED = 1 << 8;
        /// The element list is being replaced
        const CHANGING = 1 << 9;
    }
}

/// Atomic set of [`ContentFlags`]
#[derive(Debug, Default)]
pub struct ContentStatus {
    bits: AtomicU16,
}

impl ContentStatus {
    pub fn new(flags: ContentFlags) -> Self {
        Self {
            bits: AtomicU16::new(flags.bits()),
        }
    }

    pub fn flags(&self) -> ContentFlags {
        ContentFlags::from_bits_truncate(self.bits.load(Ordering::SeqCst))
    }

    pub fn is(&self, flag: ContentFlags) -> bool {
        self.flags().contains(flag)
    }

    /// Set or clear `flag`; returns true if the value changed
    pub fn set(&self, flag: ContentFlags, value: bool) -> bool {
        let previous = if value {
            self.bits.fetch_or(flag.bits(), Ordering::SeqCst)
        } else {
            self.bits.fetch_and(!flag.bits(), Ordering::SeqCst)
        };
        ContentFlags::from_bits_truncate(previous).contains(flag) != value
    }
}
