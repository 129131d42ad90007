//! Connection context consumed by the scheduling layer

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::{ConnectionId, ConnectionSettings};

/// What the interface queue and dynamic content need to know about the
/// connection that owns them.
pub trait ConnectionContext: Send + Sync {
    /// Unique id of the connection
    fn id(&self) -> ConnectionId;

    /// Display name, used for thread names and progress titles
    fn name(&self) -> String;

    /// Configured pool size, bounding concurrent interface tasks
    fn max_pool_size(&self) -> usize;

    /// Whether the connection has been disposed
    fn is_disposed(&self) -> bool {
        false
    }
}

/// A connection handle holding live-updatable settings
pub struct ConnectionHandle {
    id: ConnectionId,
    settings: RwLock<ConnectionSettings>,
    disposed: AtomicBool,
}

impl ConnectionHandle {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self::with_id(ConnectionId::new(), settings)
    }

    pub fn with_id(id: ConnectionId, settings: ConnectionSettings) -> Self {
        Self {
            id,
            settings: RwLock::new(settings),
            disposed: AtomicBool::new(false),
        }
    }

    /// Snapshot of the current settings
    pub fn settings(&self) -> ConnectionSettings {
        self.settings.read().clone()
    }

    /// Replace the settings; picked up by queues on their next admission check
    pub fn update_settings(&self, settings: ConnectionSettings) {
        tracing::debug!(
            connection_id = %self.id,
            max_pool_size = settings.max_pool_size(),
            "connection settings updated"
        );
        *self.settings.write() = settings;
    }

    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            tracing::info!(connection_id = %self.id, "connection disposed");
        }
    }
}

impl ConnectionContext for ConnectionHandle {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn name(&self) -> String {
        self.settings.read().name().to_string()
    }

    fn max_pool_size(&self) -> usize {
        self.settings.read().max_pool_size()
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}
