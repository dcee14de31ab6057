/// Error types for flux-improve
///
/// Detection failures never show up here: probes absorb them locally.
/// Everything in this enum is surfaced to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for flux-improve operations
#[derive(Error, Debug)]
pub enum FluxError {
    /// I/O errors (file operations, stdin, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Matcher input is not JSON of the expected shape
    #[error("Invalid matcher input: {0}")]
    Parse(#[source] serde_json::Error),

    /// Output serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Atomic replace of the preferences record failed
    #[error("Failed to write preferences to {}: {source}", path.display())]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not acquire the preferences lock in time
    #[error("Preferences lock error: {0}")]
    StoreLock(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad arguments to a preference operation
    #[error("Usage error: {0}")]
    Usage(String),

    /// A detection task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type alias for flux-improve operations
pub type Result<T> = std::result::Result<T, FluxError>;

/// Convert FluxError to a user-friendly error message
impl FluxError {
    pub fn user_message(&self) -> String {
        match self {
            FluxError::Io(e) => {
                format!("File system error. Check permissions. Details: {}", e)
            }
            FluxError::Parse(e) => {
                format!(
                    "Could not read the matcher input; expected {{ installed, context, preferences }}. Details: {}",
                    e
                )
            }
            FluxError::Serialization(e) => {
                format!("Data format error: {}", e)
            }
            FluxError::StoreWrite { path, source } => {
                format!(
                    "Could not save preferences to {}. Your previous preferences are unchanged. Details: {}",
                    path.display(),
                    source
                )
            }
            FluxError::StoreLock(msg) => {
                format!("Another flux-improve process is busy with your preferences: {}", msg)
            }
            FluxError::Config(msg) => {
                format!("Configuration issue: {}", msg)
            }
            FluxError::Usage(msg) => msg.clone(),
            FluxError::Task(e) => {
                format!("Detection was interrupted: {}", e)
            }
        }
    }
}
