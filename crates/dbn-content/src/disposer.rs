//! Disposal of replaced elements

use std::sync::Arc;

use dbn_core::Platform;

use crate::ContentElement;

/// Disposes elements either inline or on a platform worker
#[derive(Clone)]
pub struct BackgroundDisposer {
    platform: Arc<dyn Platform>,
}

impl BackgroundDisposer {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self { platform }
    }

    pub fn dispose<T: ContentElement>(&self, content: &str, elements: Vec<Arc<T>>, background: bool) {
        if elements.is_empty() {
            return;
        }

        tracing::trace!(content, count = elements.len(), background, "disposing elements");
        let job = move || elements.iter().for_each(|element| element.dispose());
        if background {
            self.platform
                .run_in_background(&format!("Disposing {content}"), Box::new(job));
        } else {
            job();
        }
    }
}
