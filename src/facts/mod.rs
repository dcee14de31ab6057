/// Fact detection module
///
/// Machine-level facts: operating system and what is installed on it,
/// plus session insights when a caller supplies them.

pub mod insights;
pub mod os_detector;
pub mod probes;
pub mod provider;

pub use insights::{SessionInsights, SessionSignal};
pub use os_detector::OperatingSystem;
pub use probes::Probe;
pub use provider::{FactProvider, FactSheet, FactSnapshot, Installed};
