/// Operating system detection
///
/// The one authoritative fact: computed first, never degraded, and consulted
/// by the other probes to pick an enumeration strategy.

use serde::{Deserialize, Serialize};
use std::env;

/// Supported operating systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystem {
    MacOs,
    Linux,
    Windows,
}

impl OperatingSystem {
    /// Get the OS name as a string
    pub fn name(&self) -> &str {
        match self {
            OperatingSystem::MacOs => "macos",
            OperatingSystem::Linux => "linux",
            OperatingSystem::Windows => "windows",
        }
    }

    /// Whether the OS has a notion of installed applications we can list
    pub fn lists_applications(&self) -> bool {
        !matches!(self, OperatingSystem::Windows)
    }

    /// The platform this binary was built for
    pub fn current() -> Self {
        Self::from_target(env::consts::OS)
    }

    /// Map a target OS string onto the three supported families
    ///
    /// BSDs and other unixes are treated as linux.
    pub fn from_target(os: &str) -> Self {
        match os {
            "macos" | "ios" => OperatingSystem::MacOs,
            "windows" => OperatingSystem::Windows,
            _ => OperatingSystem::Linux,
        }
    }
}

impl std::fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
