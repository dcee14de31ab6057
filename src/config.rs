/// Paths flux-improve reads from and writes to
///
/// Everything is user-scoped and hangs off the home directory. Each path can
/// be overridden through the environment so tests and CI never touch the
/// real home. Without a home directory only the overridden paths are used.

use crate::error::{FluxError, Result};
use crate::facts::OperatingSystem;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default state directory name under the home directory
const FLUX_DIR: &str = ".flux";

/// Preferences record file name
const PREFERENCES_FILE: &str = "preferences.json";

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Home directory the user-scoped defaults are derived from
    pub home: Option<PathBuf>,
    /// Root for system-wide locations (`/` outside of tests)
    pub system_root: PathBuf,
    /// The single persisted preferences record
    pub preferences_path: PathBuf,
    /// Files whose `mcpServers` keys list the installed servers
    pub mcp_config_paths: Vec<PathBuf>,
    /// Host plugin registry
    pub plugin_registry_path: Option<PathBuf>,
    /// Search path for CLI probes; `None` means the process `PATH`
    pub search_path: Option<OsString>,
}

impl Config {
    /// Build the default layout for a given home directory
    pub fn with_home<P: AsRef<Path>>(home: P) -> Self {
        let home = home.as_ref().to_path_buf();
        let flux_dir = home.join(FLUX_DIR);

        Self {
            preferences_path: flux_dir.join(PREFERENCES_FILE),
            mcp_config_paths: vec![home.join(".mcp.json"), home.join(".claude.json")],
            plugin_registry_path: Some(
                home.join(".claude")
                    .join("plugins")
                    .join("installed_plugins.json"),
            ),
            system_root: PathBuf::from("/"),
            search_path: None,
            home: Some(home),
        }
    }

    /// Layout for a machine with no home directory
    ///
    /// Home-relative sources (MCP configs, plugin registry, user app dirs)
    /// are left out.
    pub fn without_home<P: AsRef<Path>>(preferences_path: P) -> Self {
        Self {
            home: None,
            system_root: PathBuf::from("/"),
            preferences_path: preferences_path.as_ref().to_path_buf(),
            mcp_config_paths: Vec::new(),
            plugin_registry_path: None,
            search_path: None,
        }
    }

    /// Resolve configuration from the home directory and `FLUX_*` overrides
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_prefs(None)
    }

    /// Same as `from_env`, with `prefs_file` taking precedence over
    /// `FLUX_PREFS_FILE`
    pub fn from_env_with_prefs(prefs_file: Option<PathBuf>) -> Result<Self> {
        Self::resolve(dirs::home_dir(), |key| match key {
            "FLUX_PREFS_FILE" => prefs_file.clone().or_else(|| env_path(key)),
            _ => env_path(key),
        })
    }

    /// Resolve against an explicit home and variable lookup
    ///
    /// # Returns
    /// * `Ok(Config)` - Resolved configuration
    /// * `Err(FluxError)` - No home directory and no preferences override
    pub fn resolve<F>(home: Option<PathBuf>, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<PathBuf>,
    {
        let preferences_override = var("FLUX_PREFS_FILE")
            .or_else(|| var("FLUX_HOME").map(|flux_home| flux_home.join(PREFERENCES_FILE)));

        let mut config = match (home, &preferences_override) {
            (Some(home), _) => Self::with_home(home),
            (None, Some(preferences_path)) => {
                warn!("no home directory, skipping home-relative sources");
                Self::without_home(preferences_path)
            }
            (None, None) => {
                return Err(FluxError::Config(
                    "Could not determine home directory; set FLUX_HOME or FLUX_PREFS_FILE"
                        .to_string(),
                ))
            }
        };

        if let Some(preferences_path) = preferences_override {
            config.preferences_path = preferences_path;
        }
        if let Some(mcp) = var("FLUX_MCP_CONFIG") {
            config.mcp_config_paths = vec![mcp];
        }
        if let Some(registry) = var("FLUX_PLUGIN_REGISTRY") {
            config.plugin_registry_path = Some(registry);
        }

        Ok(config)
    }

    /// Directories scanned for installed applications on `os`
    pub fn application_dirs(&self, os: OperatingSystem) -> Vec<PathBuf> {
        let (system, user) = match os {
            OperatingSystem::MacOs => ("Applications", "Applications"),
            OperatingSystem::Linux => ("usr/share/applications", ".local/share/applications"),
            OperatingSystem::Windows => return Vec::new(),
        };

        let mut dirs = vec![self.system_root.join(system)];
        if let Some(home) = &self.home {
            dirs.push(home.join(user));
        }
        dirs
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
