//! Descriptors of scheduled database work

use dbn_core::{ConnectionId, SchemaId};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Priority of an interface task; higher priorities dequeue first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Lowest,
    Low,
    #[default]
    Medium,
    High,
    Highest,
}

/// What to run, for whom, and how urgently
///
/// Requests are immutable once built. An empty title means the task never
/// gets a visible progress indicator.
#[derive(Debug, Clone)]
pub struct InterfaceTaskRequest {
    title: String,
    text: String,
    priority: TaskPriority,
    connection_id: ConnectionId,
    schema_id: Option<SchemaId>,
    cancellation: Option<CancellationToken>,
}

impl InterfaceTaskRequest {
    pub fn new(
        title: impl Into<String>,
        text: impl Into<String>,
        priority: TaskPriority,
        connection_id: ConnectionId,
    ) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            priority,
            connection_id,
            schema_id: None,
            cancellation: None,
        }
    }

    /// A request that never shows progress
    pub fn silent(priority: TaskPriority, connection_id: ConnectionId) -> Self {
        Self::new("", "", priority, connection_id)
    }

    /// Attach the schema the work runs against
    pub fn with_schema(mut self, schema_id: SchemaId) -> Self {
        self.schema_id = Some(schema_id);
        self
    }

    /// Attach the cancellation signal of the surrounding operation
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn priority(&self) -> TaskPriority {
        self.priority
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn schema_id(&self) -> Option<&SchemaId> {
        self.schema_id.as_ref()
    }

    /// Whether the task asks for a visible progress indicator
    pub fn has_progress(&self) -> bool {
        !self.title.is_empty()
    }

    /// Whether the surrounding operation has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}
