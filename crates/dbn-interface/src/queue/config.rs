//! Queue configuration types

use std::path::Path;
use std::time::Duration;

use dbn_core::DbnError;
use serde::{Deserialize, Serialize};

/// Configuration for interface queues
///
/// Controls how long callers wait between re-checks, when they give up,
/// and how many progress indicators may be shown at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Re-check interval in milliseconds for a waiting caller
    caller_wait_interval_ms: u64,
    /// Re-check interval in milliseconds while a modal dialog is shown
    modal_wait_interval_ms: u64,
    /// Time in milliseconds after which a waiting caller gives up
    task_timeout_ms: u64,
    /// Maximum tasks running under a progress indicator, across all connections
    max_progress_tasks: usize,
    /// Concurrency cap used when the connection is gone or disposed
    fallback_max_active_tasks: usize,
}

impl QueueConfig {
    /// Set the caller re-check interval in milliseconds
    pub fn with_caller_wait_interval_ms(mut self, interval_ms: u64) -> Self {
        self.caller_wait_interval_ms = interval_ms.max(1);
        self
    }

    /// Set the re-check interval used while a modal dialog is shown
    pub fn with_modal_wait_interval_ms(mut self, interval_ms: u64) -> Self {
        self.modal_wait_interval_ms = interval_ms.max(1);
        self
    }

    /// Set the caller-side timeout in milliseconds
    pub fn with_task_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.task_timeout_ms = timeout_ms;
        self
    }

    /// Set the progress indicator limit
    pub fn with_max_progress_tasks(mut self, max: usize) -> Self {
        self.max_progress_tasks = max;
        self
    }

    /// Set the concurrency cap used without a live connection
    pub fn with_fallback_max_active_tasks(mut self, max: usize) -> Self {
        self.fallback_max_active_tasks = max.max(1);
        self
    }

    pub fn caller_wait_interval(&self) -> Duration {
        Duration::from_millis(self.caller_wait_interval_ms)
    }

    pub fn modal_wait_interval(&self) -> Duration {
        Duration::from_millis(self.modal_wait_interval_ms)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }

    pub fn max_progress_tasks(&self) -> usize {
        self.max_progress_tasks
    }

    pub fn fallback_max_active_tasks(&self) -> usize {
        self.fallback_max_active_tasks
    }

    /// Reject values the builders would have clamped
    pub fn validate(&self) -> dbn_core::Result<()> {
        let positive = [
            ("caller_wait_interval_ms", self.caller_wait_interval_ms),
            ("modal_wait_interval_ms", self.modal_wait_interval_ms),
            ("fallback_max_active_tasks", self.fallback_max_active_tasks as u64),
        ];
        if let Some((key, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(DbnError::Configuration(format!(
                "queue config: {key} must be greater than 0"
            )));
        }
        Ok(())
    }

    /// Parse a configuration from TOML; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> dbn_core::Result<Self> {
        let config: Self = dbn_core::from_toml_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> dbn_core::Result<Self> {
        let config: Self = dbn_core::from_toml_file(path)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for QueueConfig {
    /// Defaults:
    /// - caller_wait_interval: 10 seconds
    /// - modal_wait_interval: 1 second
    /// - task_timeout: 5 minutes
    /// - max_progress_tasks: 10
    /// - fallback_max_active_tasks: 10
    fn default() -> Self {
        Self {
            caller_wait_interval_ms: 10_000,
            modal_wait_interval_ms: 1_000,
            task_timeout_ms: 300_000,
            max_progress_tasks: 10,
            fallback_max_active_tasks: 10,
        }
    }
}
