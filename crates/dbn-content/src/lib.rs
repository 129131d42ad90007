//! DBN Content - Lazily loaded, dependency-aware metadata collections
//!
//! A [`DynamicContent`] holds the child elements of a database object (the
//! tables of a schema, the columns of a table, ...). It loads them on first
//! access through an injected [`ContentLoader`], tracks whether they are
//! stale, and lets a [`ContentDependencyAdapter`] decide when loading is
//! possible at all.
//!
//! # Example
//!
//! ```ignore
//! use dbn_content::{BasicDependencyAdapter, DynamicContent, QueuedContentLoader};
//!
//! let loader = QueuedContentLoader::new(queue.clone(), "Loading tables", move || fetch_tables(&pool));
//! let tables = DynamicContent::builder("tables", Arc::new(loader), platform)
//!     .dependency(Arc::new(BasicDependencyAdapter::new(&connection)))
//!     .master()
//!     .build();
//!
//! for table in tables.get_elements().iter() {
//!     println!("{}", table.name());
//! }
//! ```

mod config;
mod content;
mod dependency;
mod disposer;
mod element;
mod filter;
mod listener;
mod loader;
mod status;

pub use config::ContentConfig;
pub use content::{DynamicContent, DynamicContentBuilder};
pub use dependency::{
    BasicDependencyAdapter, ContentDependencyAdapter, SubcontentDependencyAdapter,
    VoidDependencyAdapter,
};
pub use disposer::BackgroundDisposer;
pub use element::{ContentElement, ElementSorter, NameSorter};
pub use filter::{ContentFilter, ElementList, Elements};
pub use listener::ContentChangeListener;
pub use loader::{ContentLoader, QueuedContentLoader, SubcontentLoader};
pub use status::{ContentFlags, ContentStatus};
