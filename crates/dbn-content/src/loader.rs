//! Content loaders

use std::sync::Arc;

use dbn_core::{Result, SchemaId};
use dbn_interface::{InterfaceQueue, InterfaceTaskRequest, TaskPriority};

use crate::{ContentElement, DynamicContent};

/// Produces the elements of a dynamic content
pub trait ContentLoader<T: ContentElement>: Send + Sync {
    /// Fetch the complete element list. `force` is set for explicit reloads.
    fn load_elements(&self, content: &DynamicContent<T>, force: bool) -> Result<Vec<Arc<T>>>;
}

type Fetch<T> = Arc<dyn Fn() -> Result<Vec<T>> + Send + Sync>;

/// Loads elements by running a metadata fetch through a connection's
/// interface queue and waiting for its result
pub struct QueuedContentLoader<T> {
    queue: Arc<InterfaceQueue>,
    title: String,
    priority: TaskPriority,
    schema_id: Option<SchemaId>,
    fetch: Fetch<T>,
}

impl<T: ContentElement> QueuedContentLoader<T> {
    pub fn new<F>(queue: Arc<InterfaceQueue>, title: impl Into<String>, fetch: F) -> Self
    where
        F: Fn() -> Result<Vec<T>> + Send + Sync + 'static,
    {
        Self {
            queue,
            title: title.into(),
            priority: TaskPriority::Medium,
            schema_id: None,
            fetch: Arc::new(fetch),
        }
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_schema(mut self, schema_id: SchemaId) -> Self {
        self.schema_id = Some(schema_id);
        self
    }
}

impl<T: ContentElement> ContentLoader<T> for QueuedContentLoader<T> {
    fn load_elements(&self, content: &DynamicContent<T>, _force: bool) -> Result<Vec<Arc<T>>> {
        let mut request = InterfaceTaskRequest::new(
            self.title.clone(),
            content.name(),
            self.priority,
            self.queue.connection_id(),
        );
        if let Some(schema_id) = &self.schema_id {
            request = request.with_schema(schema_id.clone());
        }

        let fetch = self.fetch.clone();
        let rows = self.queue.schedule_and_return(request, move || fetch())?;
        Ok(rows.into_iter().map(Arc::new).collect())
    }
}

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Derives elements from a source content by filtering its full list
pub struct SubcontentLoader<T: ContentElement> {
    source: Arc<DynamicContent<T>>,
    predicate: Predicate<T>,
}

impl<T: ContentElement> SubcontentLoader<T> {
    pub fn new<P>(source: Arc<DynamicContent<T>>, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            source,
            predicate: Arc::new(predicate),
        }
    }
}

impl<T: ContentElement> ContentLoader<T> for SubcontentLoader<T> {
    fn load_elements(&self, _content: &DynamicContent<T>, _force: bool) -> Result<Vec<Arc<T>>> {
        Ok(self
            .source
            .all_elements()
            .iter()
            .filter(|element| (self.predicate)(element))
            .cloned()
            .collect())
    }
}
