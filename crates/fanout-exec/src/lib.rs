mod error;
pub use error::{ExecError, ExecResult};

pub mod catalog;
pub use catalog::{Catalog, Product};

pub mod sim;
pub use sim::{BackendSimulator, FailurePolicy, LatencyPolicy, SimulatorConfig};

#[cfg(test)]
mod scenarios;

pub mod prelude {
    pub use crate::error::{ExecError, ExecResult};
    pub use crate::{BackendSimulator, Catalog, FailurePolicy, LatencyPolicy, Product};
}
