//! Content loaded through a connection's interface queue

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use dbn_content::{
    BasicDependencyAdapter, ContentElement, DynamicContent, QueuedContentLoader,
};
use dbn_core::{
    ConnectionContext, ConnectionHandle, ConnectionSettings, DbnError, Platform, SchemaId,
    TokioPlatform,
};
use dbn_interface::{InterfaceQueue, InterfaceThreadMonitor, QueueConfig, TaskPriority};
use pretty_assertions::assert_eq;

#[derive(Debug)]
struct Table {
    name: String,
}

impl ContentElement for Table {
    fn name(&self) -> &str {
        &self.name
    }
}

struct Setup {
    handle: Arc<ConnectionHandle>,
    connection: Arc<dyn ConnectionContext>,
    platform: Arc<dyn Platform>,
    queue: Arc<InterfaceQueue>,
}

fn setup() -> Setup {
    dbn_core::logging::init_for_tests();

    let handle = Arc::new(ConnectionHandle::new(
        ConnectionSettings::new("HR").with_max_pool_size(2),
    ));
    let connection: Arc<dyn ConnectionContext> = handle.clone();
    let platform: Arc<dyn Platform> = Arc::new(TokioPlatform::with_max_workers(8).unwrap());
    let queue = Arc::new(
        InterfaceQueue::new(
            &connection,
            platform.clone(),
            Arc::new(InterfaceThreadMonitor::new()),
            QueueConfig::default(),
        )
        .unwrap(),
    );
    Setup {
        handle,
        connection,
        platform,
        queue,
    }
}

fn tables(
    setup: &Setup,
    fetches: Arc<AtomicUsize>,
    fetch: fn() -> dbn_core::Result<Vec<Table>>,
) -> Arc<DynamicContent<Table>> {
    let loader = QueuedContentLoader::new(setup.queue.clone(), "Loading tables", move || {
        fetches.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        fetch()
    })
    .with_priority(TaskPriority::High)
    .with_schema(SchemaId::new("HR"));

    DynamicContent::<Table>::builder("tables", Arc::new(loader), setup.platform.clone())
        .dependency(Arc::new(BasicDependencyAdapter::new(&setup.connection)))
        .master()
        .build()
}

fn hr_tables() -> dbn_core::Result<Vec<Table>> {
    Ok(["EMPLOYEES", "DEPARTMENTS", "JOBS"]
        .into_iter()
        .map(|name| Table {
            name: name.to_string(),
        })
        .collect())
}

#[test]
fn test_tables_load_once_through_queue() {
    let setup = setup();
    let fetches = Arc::new(AtomicUsize::new(0));
    let content = tables(&setup, fetches.clone(), hr_tables);

    let callers: Vec<_> = (0..8)
        .map(|_| {
            let content = content.clone();
            thread::spawn(move || content.get_elements())
        })
        .collect();
    let results: Vec<_> = callers
        .into_iter()
        .map(|caller| caller.join().unwrap())
        .collect();

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|elements| Arc::ptr_eq(elements, &results[0])));
    let names: Vec<_> = results[0].iter().map(|table| table.name.as_str()).collect();
    assert_eq!(names, vec!["DEPARTMENTS", "EMPLOYEES", "JOBS"]);
    assert_eq!(setup.queue.counters().finished(), 1);
}

#[test]
fn test_connectivity_error_from_queue_leaves_content_dirty() {
    let setup = setup();
    let fetches = Arc::new(AtomicUsize::new(0));
    let content = tables(&setup, fetches.clone(), || {
        Err(DbnError::Connection("ORA-03113: end-of-file on communication channel".into()))
    });

    assert!(content.get_elements().is_empty());
    assert!(content.is_dirty());
    assert!(!content.is_loaded());
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[test]
fn test_disposed_connection_stops_loading() {
    let setup = setup();
    let fetches = Arc::new(AtomicUsize::new(0));
    let content = tables(&setup, fetches.clone(), hr_tables);
    content.load().unwrap();

    setup.handle.dispose();
    content.mark_dirty();
    content.reload().unwrap();

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(content.len(), 3);
    assert!(content.is_dirty());
}
