use serde::{Deserialize, Serialize};

/// Lifecycle state of a single dispatched task.
///
/// Transitions only move forward:
/// `Pending → Admitted → Executing → {Fulfilled | Rejected}`.
///
/// A task may also be rejected straight from `Pending` (its limiter was closed before it got a
/// permit) or from `Admitted` (it was cancelled before the backend call).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    /// Task is queued and waiting for a limiter permit.
    Pending,
    /// Task holds a permit and waits out its pre-dispatch delay.
    Admitted,
    /// Task is inside the backend call.
    Executing,
    /// Task completed successfully.
    Fulfilled,
    /// Task failed (throttled, generic failure or cancelled).
    Rejected,
}

impl TaskStatus {
    /// Returns `true` if the task is in a terminal state (won't transition further).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Fulfilled | TaskStatus::Rejected)
    }

    /// Returns `true` if the task is still in flight (queued, admitted or executing).
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns `true` if the task currently occupies a limiter permit.
    pub fn holds_permit(&self) -> bool {
        matches!(self, TaskStatus::Admitted | TaskStatus::Executing)
    }

    /// Whether moving from `self` to `next` is a legal forward transition.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Admitted)
                | (Pending, Rejected)
                | (Admitted, Executing)
                | (Admitted, Rejected)
                | (Executing, Fulfilled)
                | (Executing, Rejected)
        )
    }
}
