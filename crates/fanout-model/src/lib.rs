mod domain;
pub use domain::*;

mod strategy;
pub use strategy::*;
