//! Type definitions shared across Brokkr crates

mod config_types;
mod module_types;

pub use config_types::*;
pub use module_types::*;
