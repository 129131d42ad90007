//! Change notifications

use std::sync::Arc;

/// Observes element list replacements and refreshes of a dynamic content
pub trait ContentChangeListener<T>: Send + Sync {
    /// `elements` is the complete, unfiltered new list
    fn elements_changed(&self, content: &str, signature: u8, elements: &[Arc<T>]);
}
