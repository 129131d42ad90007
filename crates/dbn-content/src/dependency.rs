//! Dependency adapters
//!
//! An adapter gates loading of a dynamic content on the state of whatever it
//! depends on: the owning connection, or another content it is derived from.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use dbn_core::{ConnectionContext, Result};

use crate::{ContentElement, DynamicContent};

/// Decides whether and how a dynamic content may load
pub trait ContentDependencyAdapter: Send + Sync {
    /// Loading is possible at all
    fn can_load(&self) -> bool;

    /// Loading is cheap enough to run on any thread
    fn can_load_fast(&self) -> bool;

    /// Dependencies changed since the last successful load
    fn is_dirty(&self) -> bool {
        false
    }

    fn before_load(&self, _force: bool) -> Result<()> {
        Ok(())
    }

    fn after_load(&self) {}

    /// Mark dependency sources stale
    fn refresh_sources(&self) {}

    fn dispose(&self) {}
}

/// Content with nothing to depend on, such as virtual or in-memory content
#[derive(Debug, Clone, Copy, Default)]
pub struct VoidDependencyAdapter;

impl ContentDependencyAdapter for VoidDependencyAdapter {
    fn can_load(&self) -> bool {
        true
    }

    fn can_load_fast(&self) -> bool {
        true
    }
}

/// Content fetched over a connection; loadable while the connection lives
pub struct BasicDependencyAdapter {
    connection: Weak<dyn ConnectionContext>,
}

impl BasicDependencyAdapter {
    pub fn new(connection: &Arc<dyn ConnectionContext>) -> Self {
        Self {
            connection: Arc::downgrade(connection),
        }
    }
}

impl ContentDependencyAdapter for BasicDependencyAdapter {
    fn can_load(&self) -> bool {
        self.connection
            .upgrade()
            .is_some_and(|connection| !connection.is_disposed())
    }

    fn can_load_fast(&self) -> bool {
        false
    }
}

/// Content derived from the elements of a source content.
///
/// Becomes dirty whenever the source's signature moves past the one observed
/// at the last load.
pub struct SubcontentDependencyAdapter<T: ContentElement> {
    source: Arc<DynamicContent<T>>,
    source_signature: AtomicU8,
}

impl<T: ContentElement> SubcontentDependencyAdapter<T> {
    pub fn new(source: Arc<DynamicContent<T>>) -> Self {
        let source_signature = AtomicU8::new(source.signature());
        Self {
            source,
            source_signature,
        }
    }

    pub fn source(&self) -> &Arc<DynamicContent<T>> {
        &self.source
    }
}

impl<T: ContentElement> ContentDependencyAdapter for SubcontentDependencyAdapter<T> {
    fn can_load(&self) -> bool {
        !self.source.is_disposed()
    }

    fn can_load_fast(&self) -> bool {
        self.source.is_ready()
    }

    fn is_dirty(&self) -> bool {
        self.source.signature() != self.source_signature.load(Ordering::SeqCst)
    }

    fn before_load(&self, force: bool) -> Result<()> {
        if force && self.source.is_loaded() {
            self.source.mark_dirty();
        }
        self.source.load()
    }

    fn after_load(&self) {
        self.source_signature
            .store(self.source.signature(), Ordering::SeqCst);
    }

    fn refresh_sources(&self) {
        self.source.refresh();
    }
}
