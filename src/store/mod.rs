/// Preference storage module
///
/// The only state that survives between runs.

pub mod models;
pub mod preferences;

pub use models::Preferences;
pub use preferences::PreferenceStore;
