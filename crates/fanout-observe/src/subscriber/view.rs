use std::borrow::Borrow;

use fanout_core::DispatchEvent;
use fanout_model::{FailureKind, TaskStatus};
use tracing::{debug, error, info, trace, warn};

pub trait View {
    fn event(&self) -> &DispatchEvent;
    fn as_task(&self) -> Option<usize>;
    fn as_reason(&self) -> &str;
    fn failure(&self) -> Option<FailureKind>;
}

impl<T> View for T
where
    T: Borrow<DispatchEvent>,
{
    #[inline]
    fn event(&self) -> &DispatchEvent {
        self.borrow()
    }
    #[inline]
    fn as_task(&self) -> Option<usize> {
        self.borrow().task().map(|i| i.get())
    }
    #[inline]
    fn as_reason(&self) -> &str {
        match self.borrow() {
            DispatchEvent::TaskSettled {
                message: Some(m), ..
            } => m,
            _ => "unknown",
        }
    }
    #[inline]
    fn failure(&self) -> Option<FailureKind> {
        match self.borrow() {
            DispatchEvent::TaskSettled { failure, .. } => *failure,
            _ => None,
        }
    }
}

#[inline]
pub fn message_for(event: &DispatchEvent) -> &'static str {
    match event {
        // batch
        DispatchEvent::DispatchStarted { .. } => "dispatch started",
        DispatchEvent::DispatchCompleted { .. } => "dispatch completed (all tasks settled)",

        // lifecycle
        DispatchEvent::TaskQueued { .. } => "task queued for a permit",
        DispatchEvent::TaskAdmitted { .. } => "task admitted by limiter",
        DispatchEvent::TaskExecuting { .. } => "task calling backend",
        DispatchEvent::TaskSettled {
            status: TaskStatus::Fulfilled,
            ..
        } => "task fulfilled",
        DispatchEvent::TaskSettled {
            failure: Some(FailureKind::Throttled),
            ..
        } => "task throttled (over quota)",
        DispatchEvent::TaskSettled {
            failure: Some(FailureKind::Cancelled),
            ..
        } => "task cancelled before execution",
        DispatchEvent::TaskSettled { .. } => "task failed",
    }
}

#[inline]
pub fn log_event<E: View>(e: E) {
    let msg = message_for(e.event());

    match e.event() {
        // batch
        DispatchEvent::DispatchStarted { total } => info!(total, "{msg}"),
        DispatchEvent::DispatchCompleted {
            total,
            fulfilled,
            throttled,
            failed,
            cancelled,
            elapsed,
        } => {
            if *throttled > 0 || *failed > 0 {
                warn!(
                    total,
                    fulfilled,
                    throttled,
                    failed,
                    cancelled,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "{msg}"
                )
            } else {
                info!(
                    total,
                    fulfilled,
                    cancelled,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "{msg}"
                )
            }
        }

        // lifecycle
        DispatchEvent::TaskQueued { .. } => trace!(task = e.as_task(), "{msg}"),
        DispatchEvent::TaskAdmitted { .. } => trace!(task = e.as_task(), "{msg}"),
        DispatchEvent::TaskExecuting { .. } => debug!(task = e.as_task(), "{msg}"),
        DispatchEvent::TaskSettled { .. } => match e.failure() {
            None => debug!(task = e.as_task(), "{msg}"),
            Some(FailureKind::Throttled) => {
                warn!(task = e.as_task(), reason = e.as_reason(), "{msg}")
            }
            Some(FailureKind::Cancelled) => {
                debug!(task = e.as_task(), reason = e.as_reason(), "{msg}")
            }
            Some(FailureKind::Generic) => {
                error!(task = e.as_task(), reason = e.as_reason(), "{msg}")
            }
        },
    }
}
