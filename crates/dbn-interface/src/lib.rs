//! DBN Interface - Prioritized, throttled execution of database calls
//!
//! Every blocking database operation issued by the UI layer goes through the
//! [`InterfaceQueue`] of its connection. The queue orders pending work by
//! priority, runs at most `max_active_tasks()` tasks at once and lets the
//! calling thread wait for (or ignore) the outcome.
//!
//! # Example
//!
//! ```ignore
//! use dbn_interface::{InterfaceQueue, InterfaceTaskRequest, QueueConfig, TaskPriority};
//!
//! let queue = InterfaceQueue::new(&connection, platform, monitor, QueueConfig::default())?;
//! let request = InterfaceTaskRequest::new("Loading tables", "HR", TaskPriority::High, connection.id());
//! let tables = queue.schedule_and_return(request, move || fetch_tables(&pool))?;
//! ```

mod consumer;
mod monitor;
pub mod queue;
mod request;
mod status;
mod task;

pub use consumer::InterfaceQueueConsumer;
pub use monitor::{InterfaceThreadMonitor, ThreadMonitorStats};
pub use queue::{InterfaceCounters, InterfaceQueue, QueueConfig, QueueStats};
pub use request::{InterfaceTaskRequest, TaskPriority};
pub use status::InterfaceTaskStatus;
pub use task::{InterfaceTask, ScheduledTask, TaskSource};
