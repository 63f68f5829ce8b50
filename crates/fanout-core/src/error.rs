use fanout_model::FailureKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("concurrency limiter is closed")]
    LimiterClosed,
}

/// Failure reported by a [`crate::Backend`] for a single task.
///
/// Callers discriminate on `kind`; `message` is meant for display only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TaskError {
    pub kind: FailureKind,
    pub message: String,
}

impl TaskError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn throttled(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Throttled, message)
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Generic, message)
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "dispatch cancelled")
    }

    pub fn is_throttled(&self) -> bool {
        self.kind == FailureKind::Throttled
    }
}

impl From<CoreError> for TaskError {
    fn from(e: CoreError) -> Self {
        TaskError::generic(e.to_string())
    }
}
