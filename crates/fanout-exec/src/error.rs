use fanout_core::TaskError;
use fanout_model::{FailureKind, TaskIndex};
use thiserror::Error;

pub type ExecResult<T> = Result<T, ExecError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("429 Too Many Requests")]
    Throttled,
    #[error("item {} failed", .0.get() + 1)]
    Failed(TaskIndex),
    #[error("no catalog entry for task {0}")]
    MissingEntry(TaskIndex),
}

impl ExecError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ExecError::Throttled => FailureKind::Throttled,
            ExecError::Failed(_) | ExecError::MissingEntry(_) => FailureKind::Generic,
        }
    }
}

impl From<ExecError> for TaskError {
    fn from(e: ExecError) -> Self {
        TaskError::new(e.kind(), e.to_string())
    }
}
