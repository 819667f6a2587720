//! Schema module - Configuration, scenario and statistics types.

mod config;
mod scenario;
mod stats;

pub use config::*;
pub use scenario::*;
pub use stats::*;
