mod view;
pub use view::{View, log_event, message_for};

use fanout_core::{DispatchEvent, Subscribe};

/// Dispatch subscriber that writes every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSubscriber;

impl Subscribe for LogSubscriber {
    fn on_event(&self, event: &DispatchEvent) {
        log_event(event);
    }
}
