//! End-to-end scheduling through a real worker pool

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use dbn_core::{ConnectionContext, ConnectionHandle, ConnectionSettings, TokioPlatform};
use dbn_interface::{
    InterfaceQueue, InterfaceTaskRequest, InterfaceThreadMonitor, QueueConfig, TaskPriority,
};
use parking_lot::{Condvar, Mutex};
use pretty_assertions::assert_eq;

fn wait_until(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_high_priority_callers_are_served_first() {
    dbn_core::logging::init_for_tests();

    let connection: Arc<dyn ConnectionContext> = Arc::new(ConnectionHandle::new(
        ConnectionSettings::new("HR").with_max_pool_size(2),
    ));
    let platform = Arc::new(TokioPlatform::with_max_workers(8).unwrap());
    let queue = Arc::new(
        InterfaceQueue::new(
            &connection,
            platform,
            Arc::new(InterfaceThreadMonitor::new()),
            QueueConfig::default(),
        )
        .unwrap(),
    );

    let gate = Arc::new((Mutex::new(false), Condvar::new()));
    for _ in 0..2 {
        let gate = gate.clone();
        queue
            .schedule_and_forget(
                InterfaceTaskRequest::silent(TaskPriority::Highest, connection.id()),
                move || {
                    let (open, changed) = &*gate;
                    let mut open = open.lock();
                    while !*open {
                        changed.wait(&mut open);
                    }
                    Ok(())
                },
            )
            .unwrap();
    }
    wait_until(|| queue.counters().running() == 2);

    let order = Arc::new(Mutex::new(Vec::new()));
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let priorities = [
        TaskPriority::Low,
        TaskPriority::High,
        TaskPriority::Low,
        TaskPriority::High,
        TaskPriority::Low,
    ];

    let callers: Vec<_> = priorities
        .into_iter()
        .enumerate()
        .map(|(index, priority)| {
            let queue = queue.clone();
            let connection_id = connection.id();
            let (order, active, peak) = (order.clone(), active.clone(), peak.clone());
            thread::spawn(move || {
                queue.schedule_and_return(
                    InterfaceTaskRequest::silent(priority, connection_id),
                    move || {
                        order.lock().push(priority);
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        active.fetch_sub(1, Ordering::SeqCst);
                        Ok(index * 10)
                    },
                )
            })
        })
        .collect();
    wait_until(|| queue.size() == 5);

    {
        let (open, changed) = &*gate;
        *open.lock() = true;
        changed.notify_all();
    }

    let results: Vec<usize> = callers
        .into_iter()
        .map(|caller| caller.join().unwrap().unwrap())
        .collect();
    assert_eq!(results, vec![0, 10, 20, 30, 40]);

    let order = order.lock();
    assert_eq!(order[..2].to_vec(), vec![TaskPriority::High, TaskPriority::High]);
    assert!(order[2..].iter().all(|priority| *priority == TaskPriority::Low));
    assert!(peak.load(Ordering::SeqCst) <= 2);

    wait_until(|| queue.counters().finished() == 7);
    assert_eq!(queue.counters().running(), 0);
}
