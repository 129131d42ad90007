//! Dynamic content lifecycle
//!
//! A content starts empty and unloaded. The first access loads it, either on
//! the calling thread or, when that thread must stay responsive, on a
//! platform worker while the caller gets the current (possibly empty) list.
//! Loads are serialized per content: concurrent requests collapse into one
//! load, and a load re-entered from its own thread is a no-op.
//!
//! Load failures never escape as errors except cancellation. Unsupported
//! features leave the content loaded but empty and flagged with an error;
//! anything else leaves it dirty so the next access retries.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use dbn_core::{DbnError, Platform, Result, ThreadKind};
use parking_lot::{ReentrantMutex, RwLock};

use crate::{
    BackgroundDisposer, ContentChangeListener, ContentConfig, ContentDependencyAdapter,
    ContentElement, ContentFilter, ContentFlags, ContentLoader, ContentStatus, ElementList,
    ElementSorter, Elements, NameSorter, VoidDependencyAdapter,
};

/// Lazily loaded, dependency-aware list of database elements
pub struct DynamicContent<T: ContentElement> {
    name: String,
    status: ContentStatus,
    signature: AtomicU8,
    elements: RwLock<ElementList<T>>,
    loader: Arc<dyn ContentLoader<T>>,
    dependency: Arc<dyn ContentDependencyAdapter>,
    sorter: Arc<dyn ElementSorter<T>>,
    filter: Option<Arc<dyn ContentFilter<T>>>,
    listeners: RwLock<Vec<Arc<dyn ContentChangeListener<T>>>>,
    platform: Arc<dyn Platform>,
    disposer: BackgroundDisposer,
    config: ContentConfig,
    load_lock: ReentrantMutex<()>,
    this: Weak<Self>,
}

/// Clears a status flag when dropped, including during unwinding
struct FlagGuard<'a> {
    status: &'a ContentStatus,
    flag: ContentFlags,
}

impl<'a> FlagGuard<'a> {
    /// Set `flag` for the lifetime of the guard
    fn enter(status: &'a ContentStatus, flag: ContentFlags) -> Self {
        status.set(flag, true);
        Self::adopt(status, flag)
    }

    /// Take over a flag that is already set
    fn adopt(status: &'a ContentStatus, flag: ContentFlags) -> Self {
        Self { status, flag }
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.status.set(self.flag, false);
    }
}

impl<T: ContentElement> DynamicContent<T> {
    pub fn builder(
        name: impl Into<String>,
        loader: Arc<dyn ContentLoader<T>>,
        platform: Arc<dyn Platform>,
    ) -> DynamicContentBuilder<T> {
        DynamicContentBuilder {
            name: name.into(),
            loader,
            platform,
            dependency: Arc::new(VoidDependencyAdapter),
            sorter: Arc::new(NameSorter),
            filter: None,
            flags: ContentFlags::empty(),
            config: ContentConfig::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Load counter, incremented on every load attempt and wrapping at 256
    pub fn signature(&self) -> u8 {
        self.signature.load(Ordering::SeqCst)
    }

    pub fn flags(&self) -> ContentFlags {
        self.status.flags()
    }

    pub fn dependency(&self) -> &Arc<dyn ContentDependencyAdapter> {
        &self.dependency
    }

    pub fn is_loaded(&self) -> bool {
        self.status.is(ContentFlags::LOADED)
    }

    pub fn is_loading(&self) -> bool {
        self.status.is(ContentFlags::LOADING)
    }

    pub fn is_loading_in_background(&self) -> bool {
        self.status.is(ContentFlags::LOADING_IN_BACKGROUND)
    }

    /// Marked dirty, or its dependencies changed since the last load
    pub fn is_dirty(&self) -> bool {
        self.status.is(ContentFlags::DIRTY) || self.dependency.is_dirty()
    }

    /// Loaded, not loading and not dirty
    pub fn is_ready(&self) -> bool {
        self.is_loaded() && !self.is_loading() && !self.is_dirty()
    }

    pub fn is_disposed(&self) -> bool {
        self.status.is(ContentFlags::DISPOSED)
    }

    pub fn has_error(&self) -> bool {
        self.status.is(ContentFlags::ERROR)
    }

    pub fn is_master(&self) -> bool {
        self.status.is(ContentFlags::MASTER)
    }

    /// Visible elements, loading them first if needed.
    ///
    /// Loads on the calling thread when it may block or when the dependency
    /// adapter reports the load as fast. Otherwise a background load is
    /// started and the current elements are returned right away.
    pub fn get_elements(&self) -> Elements<T> {
        if self.should_load() {
            if ThreadKind::current().allows_sync_load() || self.dependency.can_load_fast() {
                if let Err(error) = self.ensure_loaded(false) {
                    tracing::debug!(content = %self.name, %error, "content load interrupted");
                }
            } else {
                self.load_in_background(false);
            }
        }
        self.elements.read().visible()
    }

    /// Visible elements whose name matches `name`, ignoring ASCII case
    pub fn get_elements_named(&self, name: &str) -> Vec<Arc<T>> {
        self.get_elements()
            .iter()
            .filter(|element| element.name().eq_ignore_ascii_case(name))
            .cloned()
            .collect()
    }

    pub fn get_element(&self, name: &str, overload: u16) -> Option<Arc<T>> {
        self.get_elements()
            .iter()
            .find(|element| {
                element.overload() == overload && element.name().eq_ignore_ascii_case(name)
            })
            .cloned()
    }

    /// Every element regardless of filters, without triggering a load
    pub fn all_elements(&self) -> Elements<T> {
        self.elements.read().all()
    }

    /// Number of visible elements, without triggering a load
    pub fn len(&self) -> usize {
        self.elements.read().visible().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load unless the content is already ready
    pub fn load(&self) -> Result<()> {
        self.ensure_loaded(false)
    }

    /// Load again, synchronously. Only applies to loaded content that is
    /// not currently loading.
    pub fn reload(&self) -> Result<()> {
        if !self.is_loaded() || self.is_loading() {
            return Ok(());
        }
        self.mark_dirty();
        self.ensure_loaded(true)
    }

    /// Mark this content and its dependency sources stale without loading
    pub fn refresh(&self) {
        if !self.is_loaded() || self.is_loading() {
            return;
        }
        self.mark_dirty();
        self.dependency.refresh_sources();
        self.notify_listeners(&self.all_elements());
    }

    /// Submit a load to a platform worker. At most one background load is
    /// pending per content.
    pub fn load_in_background(&self, force: bool) {
        if !self.should_load() || !self.status.set(ContentFlags::LOADING_IN_BACKGROUND, true) {
            return;
        }
        let Some(this) = self.this.upgrade() else {
            self.status.set(ContentFlags::LOADING_IN_BACKGROUND, false);
            return;
        };

        tracing::trace!(content = %self.name, force, "scheduling background load");
        self.platform.run_in_background(
            &format!("Loading {}", self.name),
            Box::new(move || {
                let _pending = FlagGuard::adopt(&this.status, ContentFlags::LOADING_IN_BACKGROUND);
                if let Err(error) = this.ensure_loaded(force) {
                    tracing::debug!(content = %this.name, %error, "background load interrupted");
                }
            }),
        );
    }

    pub fn reload_in_background(&self) {
        if !self.is_loaded() || self.is_loading() {
            return;
        }
        self.mark_dirty();
        self.load_in_background(true);
    }

    pub fn mark_dirty(&self) {
        if self.status.set(ContentFlags::DIRTY, true) {
            tracing::trace!(content = %self.name, "content marked dirty");
        }
    }

    /// Replace the element list.
    ///
    /// Elements are sorted and wrapped in a filtered view unless the content
    /// is internal or virtual. When this content is the master, replaced
    /// elements that are not part of the new list are disposed.
    pub fn set_elements(&self, elements: Vec<Arc<T>>) {
        self.replace_elements(elements);
    }

    pub fn add_change_listener(&self, listener: Arc<dyn ContentChangeListener<T>>) {
        self.listeners.write().push(listener);
    }

    /// Release the elements and stop loading. Idempotent.
    ///
    /// Waits for a load in progress on another thread, so elements that load
    /// publishes are released too.
    pub fn dispose(&self) {
        let _lock = self.load_lock.lock();
        if !self.status.set(ContentFlags::DISPOSED, true) {
            return;
        }

        let previous = std::mem::replace(&mut *self.elements.write(), ElementList::empty()).all();
        if self.is_master() {
            self.disposer.dispose(
                &self.name,
                Arc::unwrap_or_clone(previous),
                self.config.dispose_in_background,
            );
        }
        self.dependency.dispose();
        self.listeners.write().clear();
        tracing::debug!(content = %self.name, "content disposed");
    }

    fn should_load(&self) -> bool {
        !self.is_disposed() && (!self.is_loaded() || self.is_dirty()) && self.dependency.can_load()
    }

    fn ensure_loaded(&self, force: bool) -> Result<()> {
        let _lock = self.load_lock.lock();
        // Re-entered from this thread's own load
        if self.is_loading() {
            return Ok(());
        }
        if !self.should_load() {
            return Ok(());
        }

        let _loading = FlagGuard::enter(&self.status, ContentFlags::LOADING);
        let signature = self.signature.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        tracing::debug!(content = %self.name, signature, force, "loading content");

        // Sorter, listeners and element refreshes run inside the guard too
        match panic::catch_unwind(AssertUnwindSafe(|| self.perform_load(force))) {
            Ok(result) => result,
            Err(payload) => {
                let error = DbnError::from_panic(payload);
                tracing::error!(content = %self.name, %error, "content load panicked");
                self.mark_dirty();
                Ok(())
            }
        }
    }

    fn perform_load(&self, force: bool) -> Result<()> {
        let outcome = self
            .dependency
            .before_load(force)
            .and_then(|()| self.loader.load_elements(self, force));

        match outcome {
            Ok(elements) => {
                let carried = self.replace_elements(elements);
                self.status.set(ContentFlags::ERROR, false);
                self.complete_load();
                if force {
                    carried.iter().for_each(|element| element.refresh());
                }
                Ok(())
            }
            Err(error) if error.is_cancellation() => {
                self.mark_dirty();
                Err(error)
            }
            Err(DbnError::FeatureNotSupported(message)) => {
                tracing::warn!(
                    target: "dbn::notification",
                    content = %self.name,
                    %message,
                    "content not supported by the database"
                );
                self.replace_elements(Vec::new());
                self.status.set(ContentFlags::ERROR, true);
                self.complete_load();
                Ok(())
            }
            Err(error) if error.is_connectivity() => {
                tracing::debug!(content = %self.name, %error, "content load failed");
                self.mark_dirty();
                Ok(())
            }
            Err(error) => {
                tracing::error!(content = %self.name, %error, "content load failed");
                self.mark_dirty();
                Ok(())
            }
        }
    }

    fn complete_load(&self) {
        self.status.set(ContentFlags::LOADED, true);
        self.status.set(ContentFlags::DIRTY, false);
        self.dependency.after_load();
    }

    /// Publish `elements`, returning the previous elements kept in the new list
    fn replace_elements(&self, mut elements: Vec<Arc<T>>) -> Vec<Arc<T>> {
        let _lock = self.load_lock.lock();
        let _changing = FlagGuard::enter(&self.status, ContentFlags::CHANGING);
        if self.is_disposed() {
            if self.is_master() {
                self.disposer.dispose(&self.name, elements, false);
            }
            return Vec::new();
        }

        self.sorter.sort(&mut elements);
        let filter = if self
            .status
            .flags()
            .intersects(ContentFlags::INTERNAL | ContentFlags::VIRTUAL)
        {
            None
        } else {
            self.filter.clone()
        };

        let list = ElementList::new(elements, filter);
        let current = list.all();
        let previous = std::mem::replace(&mut *self.elements.write(), list).all();

        let retained: HashSet<*const T> = current.iter().map(Arc::as_ptr).collect();
        let (carried, replaced): (Vec<_>, Vec<_>) = previous
            .iter()
            .cloned()
            .partition(|element| retained.contains(&Arc::as_ptr(element)));

        self.notify_listeners(&current);
        if self.is_master() {
            self.disposer
                .dispose(&self.name, replaced, self.config.dispose_in_background);
        }
        carried
    }

    fn notify_listeners(&self, elements: &[Arc<T>]) {
        let listeners = self.listeners.read().clone();
        let signature = self.signature();
        for listener in listeners {
            listener.elements_changed(&self.name, signature, elements);
        }
    }
}

/// Assembles a [`DynamicContent`]
pub struct DynamicContentBuilder<T: ContentElement> {
    name: String,
    loader: Arc<dyn ContentLoader<T>>,
    platform: Arc<dyn Platform>,
    dependency: Arc<dyn ContentDependencyAdapter>,
    sorter: Arc<dyn ElementSorter<T>>,
    filter: Option<Arc<dyn ContentFilter<T>>>,
    flags: ContentFlags,
    config: ContentConfig,
}

impl<T: ContentElement> DynamicContentBuilder<T> {
    pub fn dependency(mut self, dependency: Arc<dyn ContentDependencyAdapter>) -> Self {
        self.dependency = dependency;
        self
    }

    pub fn sorter(mut self, sorter: Arc<dyn ElementSorter<T>>) -> Self {
        self.sorter = sorter;
        self
    }

    pub fn filter(mut self, filter: Arc<dyn ContentFilter<T>>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// The content owns its elements and disposes them
    pub fn master(mut self) -> Self {
        self.flags |= ContentFlags::MASTER;
        self
    }

    pub fn internal(mut self) -> Self {
        self.flags |= ContentFlags::INTERNAL;
        self
    }

    pub fn virtual_content(mut self) -> Self {
        self.flags |= ContentFlags::VIRTUAL;
        self
    }

    pub fn config(mut self, config: ContentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Arc<DynamicContent<T>> {
        let disposer = BackgroundDisposer::new(self.platform.clone());
        Arc::new_cyclic(|this| DynamicContent {
            name: self.name,
            status: ContentStatus::new(self.flags),
            signature: AtomicU8::new(0),
            elements: RwLock::new(ElementList::empty()),
            loader: self.loader,
            dependency: self.dependency,
            sorter: self.sorter,
            filter: self.filter,
            listeners: RwLock::new(Vec::new()),
            platform: self.platform,
            disposer,
            config: self.config,
            load_lock: ReentrantMutex::new(()),
            this: this.clone(),
        })
    }
}
