/// flux-improve library
///
/// Inspects the machine and a project directory, then reports which workflow
/// recommendations still apply after the user's dismissals and alternatives.

pub mod config;
pub mod core;
pub mod error;
pub mod facts;
pub mod intelligence;
pub mod store;

// Re-exports for convenience
pub use config::Config;
pub use error::{FluxError, Result};
