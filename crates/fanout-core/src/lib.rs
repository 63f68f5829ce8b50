pub mod error;
pub use error::{CoreError, TaskError};

pub mod backend;
pub use backend::Backend;

pub mod window;
pub use window::{RateWindow, WindowReset, WindowSnapshot};

pub mod limiter;
pub use limiter::{ConcurrencyLimiter, Limit};

pub mod events;
pub use events::{DispatchEvent, Subscribe};

pub mod dispatch;
pub use dispatch::{DispatchSummary, ResultSet, RetryPolicy, TaskDispatcher};

pub mod config;
pub use config::DispatchConfig;
