//! Interface queues for database connections
//!
//! Each connection owns one queue. Callers enqueue tasks from any thread; a
//! single monitor thread per queue dequeues them in priority order and hands
//! them to the consumer, never running a task body itself. The number of
//! dequeued-but-unfinished tasks is capped by the connection's pool size.
//!
//! # Example
//!
//! ```ignore
//! use dbn_interface::queue::{InterfaceQueue, QueueConfig};
//!
//! let config = QueueConfig::default().with_task_timeout_ms(60_000);
//! let queue = InterfaceQueue::new(&connection, platform, monitor, config)?;
//!
//! queue.schedule_and_forget(request, move || refresh_statistics(&pool))?;
//! println!("pending: {}", queue.size());
//! ```

mod config;
mod counters;
mod queue;


pub use config::QueueConfig;
pub use counters::{InterfaceCounters, QueueStats};
pub use queue::InterfaceQueue;
pub(crate) use queue::QueueShared;
