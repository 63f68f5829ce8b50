mod task_index;
pub use task_index::TaskIndex;

mod task_status;
pub use task_status::TaskStatus;

mod outcome;
pub use outcome::{FailureKind, Outcome};

/// Delay value in milliseconds.
///
/// Used in dispatch configuration and backoff rules where an explicit delay is required.
pub type DelayMs = u64;
