//! Hands dequeued tasks to worker threads

use std::sync::Arc;

use dbn_core::ProgressSpec;

use crate::ScheduledTask;
use crate::queue::QueueShared;

/// Decides how a dequeued task runs and submits it to the platform.
///
/// Tasks with a title run under a progress indicator while fewer than
/// `max_progress_tasks` progress threads are busy and no modal dialog is
/// open. Everything else runs as a plain background job.
#[derive(Debug, Clone)]
pub struct InterfaceQueueConsumer {
    max_progress_tasks: usize,
}

impl InterfaceQueueConsumer {
    pub fn new(max_progress_tasks: usize) -> Self {
        Self { max_progress_tasks }
    }

    pub fn max_progress_tasks(&self) -> usize {
        self.max_progress_tasks
    }

    pub(crate) fn accept(&self, task: Arc<dyn ScheduledTask>, queue: &Arc<QueueShared>) {
        let monitor = queue.thread_monitor();
        let platform = queue.platform();

        let progress = task.request().has_progress()
            && !platform.is_modal_active()
            && monitor.try_start_progress(self.max_progress_tasks);
        if !progress {
            monitor.start(false);
        }

        let job = {
            let queue = queue.clone();
            let task = task.clone();
            Box::new(move || queue.execute_task(task, progress))
        };

        if progress {
            let request = task.request();
            platform.run_with_progress(
                ProgressSpec {
                    title: request.title().to_string(),
                    text: request.text().to_string(),
                    connection_id: Some(queue.connection_id()),
                    connection_name: Some(queue.connection_name().to_string()),
                },
                job,
            );
        } else {
            platform.run_in_background(task.request().title(), job);
        }
    }
}
