use async_trait::async_trait;
use fanout_model::TaskIndex;

use crate::error::TaskError;

/// Something the dispatcher can send a task to.
///
/// Implementations must report every failure through [`TaskError`] with the right
/// [`fanout_model::FailureKind`]; the dispatcher turns it into a rejected outcome.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Payload produced for a fulfilled task.
    type Value: Send;

    /// Short name used in logs.
    fn name(&self) -> &'static str {
        "backend"
    }

    async fn execute(&self, index: TaskIndex) -> Result<Self::Value, TaskError>;
}
