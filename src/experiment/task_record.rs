//! Task Record - lifecycle of one generate, score and persist unit

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::grid::ParameterCombination;

/// Status of a generation task.
///
/// `Pending -> Running -> {Succeeded, Failed}`; both outcomes are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Task is created but not yet started.
    Pending,
    /// Task is generating, scoring or persisting.
    Running,
    /// Response was persisted.
    Succeeded,
    /// Task settled without a response.
    Failed,
}

impl TaskStatus {
    /// Whether the task has settled.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Lifecycle record of one grid cell's task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    index: usize,
    combination: ParameterCombination,
    status: TaskStatus,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    /// Create a pending task for the grid cell at `index`.
    #[must_use]
    pub const fn new(index: usize, combination: ParameterCombination) -> Self {
        Self {
            index,
            combination,
            status: TaskStatus::Pending,
            started_at: None,
            ended_at: None,
        }
    }

    /// Position of the combination in grid (temperature-major) order.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The `(temperature, top_p)` pair this task runs.
    #[must_use]
    pub const fn combination(&self) -> ParameterCombination {
        self.combination
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// When the task was dispatched.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// When the task settled.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Transition from Pending to Running.
    pub fn start(&mut self) {
        self.status = TaskStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Settle the task. A settled task is never reopened.
    pub fn complete(&mut self, succeeded: bool) {
        if self.status.is_terminal() {
            return;
        }
        self.status = if succeeded {
            TaskStatus::Succeeded
        } else {
            TaskStatus::Failed
        };
        self.ended_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_default() {
        let task = TaskRecord::new(0, ParameterCombination::new(0.1, 0.5));
        assert_eq!(task.status(), TaskStatus::Pending);
        assert!(task.started_at().is_none());
    }

    #[test]
    fn test_task_lifecycle() {
        let mut task = TaskRecord::new(3, ParameterCombination::new(0.9, 0.5));
        task.start();
        assert_eq!(task.status(), TaskStatus::Running);
        task.complete(true);
        assert_eq!(task.status(), TaskStatus::Succeeded);
        assert!(task.ended_at().unwrap() >= task.started_at().unwrap());
    }

    #[test]
    fn test_terminal_state_is_sticky() {
        let mut task = TaskRecord::new(0, ParameterCombination::new(0.1, 0.5));
        task.start();
        task.complete(false);
        task.complete(true);
        assert_eq!(task.status(), TaskStatus::Failed);
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
    }
}
