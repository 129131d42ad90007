//! Element filters and filtered views

use std::sync::Arc;

use parking_lot::Mutex;

/// Shared, immutable snapshot of a content's elements
pub type Elements<T> = Arc<Vec<Arc<T>>>;

/// Hides elements from the user-facing view of a content
pub trait ContentFilter<T>: Send + Sync {
    fn accepts(&self, element: &T) -> bool;

    /// Changes whenever the filter criteria change, invalidating cached views
    fn signature(&self) -> u64 {
        0
    }
}

/// Element snapshot together with its lazily computed filtered view
pub struct ElementList<T> {
    all: Elements<T>,
    filter: Option<Arc<dyn ContentFilter<T>>>,
    view: Mutex<Option<(u64, Elements<T>)>>,
}

impl<T> ElementList<T> {
    pub fn new(elements: Vec<Arc<T>>, filter: Option<Arc<dyn ContentFilter<T>>>) -> Self {
        Self {
            all: Arc::new(elements),
            filter,
            view: Mutex::new(None),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), None)
    }

    /// Every element, ignoring the filter
    pub fn all(&self) -> Elements<T> {
        self.all.clone()
    }

    /// Elements accepted by the filter.
    ///
    /// The view is cached per filter signature, so repeated calls return the
    /// same snapshot until the filter changes.
    pub fn visible(&self) -> Elements<T> {
        let Some(filter) = &self.filter else {
            return self.all.clone();
        };

        let signature = filter.signature();
        let mut view = self.view.lock();
        match view.as_ref() {
            Some((cached, elements)) if *cached == signature => elements.clone(),
            _ => {
                let elements: Elements<T> = Arc::new(
                    self.all
                        .iter()
                        .filter(|element| filter.accepts(element))
                        .cloned()
                        .collect(),
                );
                *view = Some((signature, elements.clone()));
                elements
            }
        }
    }

    pub fn is_filtered(&self) -> bool {
        self.filter.is_some()
    }
}
