use std::time::Duration;

use fanout_model::{FailureKind, TaskIndex, TaskStatus};

/// Lifecycle notification emitted by [`crate::TaskDispatcher`].
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchEvent {
    /// A batch of `total` tasks was submitted.
    DispatchStarted { total: usize },
    /// Task is queued on the limiter.
    TaskQueued { index: TaskIndex },
    /// Task obtained a limiter permit.
    TaskAdmitted { index: TaskIndex },
    /// Task is calling the backend.
    TaskExecuting { index: TaskIndex },
    /// Task reached a terminal state.
    TaskSettled {
        index: TaskIndex,
        status: TaskStatus,
        failure: Option<FailureKind>,
        message: Option<String>,
    },
    /// Every task of the batch settled. Counts match [`crate::ResultSet::summary`].
    DispatchCompleted {
        total: usize,
        fulfilled: usize,
        throttled: usize,
        failed: usize,
        cancelled: usize,
        elapsed: Duration,
    },
}

impl DispatchEvent {
    /// Task the event refers to, `None` for batch-level events.
    pub fn task(&self) -> Option<TaskIndex> {
        match self {
            DispatchEvent::TaskQueued { index }
            | DispatchEvent::TaskAdmitted { index }
            | DispatchEvent::TaskExecuting { index }
            | DispatchEvent::TaskSettled { index, .. } => Some(*index),
            DispatchEvent::DispatchStarted { .. } | DispatchEvent::DispatchCompleted { .. } => None,
        }
    }

    /// Status the task moved into, for task-level events.
    pub fn status(&self) -> Option<TaskStatus> {
        match self {
            DispatchEvent::TaskQueued { .. } => Some(TaskStatus::Pending),
            DispatchEvent::TaskAdmitted { .. } => Some(TaskStatus::Admitted),
            DispatchEvent::TaskExecuting { .. } => Some(TaskStatus::Executing),
            DispatchEvent::TaskSettled { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Receives dispatch events synchronously, on the dispatching task.
///
/// Implementations should return quickly; they run inline with the dispatch.
pub trait Subscribe: Send + Sync {
    fn on_event(&self, event: &DispatchEvent);
}
