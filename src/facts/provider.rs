/// Machine-level fact gathering
///
/// Runs the OS detection first, then every probe in isolation. `detect`
/// cannot fail: a probe error empties that one field and is logged.

use crate::config::Config;
use crate::facts::probes::Probe;
use crate::facts::{OperatingSystem, SessionInsights, SessionSignal};
use crate::store::Preferences;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// What is installed on the machine
///
/// All names are lower-case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installed {
    #[serde(default, deserialize_with = "crate::store::models::null_as_default")]
    pub cli_tools: BTreeSet<String>,
    #[serde(default, deserialize_with = "crate::store::models::null_as_default")]
    pub mcps: BTreeSet<String>,
    #[serde(default, deserialize_with = "crate::store::models::null_as_default")]
    pub applications: BTreeSet<String>,
    #[serde(default, deserialize_with = "crate::store::models::null_as_default")]
    pub plugins: BTreeSet<String>,
}

impl Installed {
    /// Whether any of `names` shows up in any installed set (case-insensitive)
    pub fn has_any(&self, names: &[&str]) -> bool {
        names.iter().any(|name| {
            let name = name.to_lowercase();
            [&self.cli_tools, &self.mcps, &self.applications, &self.plugins]
                .iter()
                .any(|set| set.iter().any(|item| item.eq_ignore_ascii_case(&name)))
        })
    }

    fn slot(&mut self, probe: Probe) -> &mut BTreeSet<String> {
        match probe {
            Probe::CliTools => &mut self.cli_tools,
            Probe::Mcps => &mut self.mcps,
            Probe::Applications => &mut self.applications,
            Probe::Plugins => &mut self.plugins,
        }
    }
}

/// Machine facts for one run
///
/// `session_insights` is never detected; it is only filled from matcher
/// input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactSheet {
    #[serde(rename = "os")]
    pub operating_system: OperatingSystem,
    pub installed: Installed,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_insights: Option<SessionInsights>,
}

impl FactSheet {
    /// A sheet with nothing installed
    pub fn empty(operating_system: OperatingSystem) -> Self {
        Self {
            operating_system,
            installed: Installed::default(),
            session_insights: None,
        }
    }

    pub fn has_session_signal(&self, signal: SessionSignal) -> bool {
        self.session_insights
            .as_ref()
            .is_some_and(|insights| insights.has(signal))
    }
}

/// Fact sheet plus the current preferences, as printed by `detect`
#[derive(Debug, Clone, Serialize)]
pub struct FactSnapshot {
    #[serde(flatten)]
    pub facts: FactSheet,
    pub preferences: Preferences,
}

/// Fact provider
pub struct FactProvider {
    config: Config,
    operating_system: OperatingSystem,
}

impl FactProvider {
    /// Create a provider for the host platform
    pub fn new(config: Config) -> Self {
        Self::for_os(config, OperatingSystem::current())
    }

    /// Create a provider that pretends to run on `operating_system`
    pub fn for_os(config: Config, operating_system: OperatingSystem) -> Self {
        Self {
            config,
            operating_system,
        }
    }

    /// Gather every fact
    pub fn detect(&self) -> FactSheet {
        let mut sheet = FactSheet::empty(self.operating_system);

        for probe in Probe::ALL {
            match probe.run(self.operating_system, &self.config) {
                Ok(found) => {
                    debug!(probe = probe.name(), count = found.len(), "probe finished");
                    *sheet.installed.slot(probe) = found;
                }
                Err(e) => {
                    warn!(probe = probe.name(), error = %e, "probe failed, treating as empty");
                }
            }
        }

        sheet
    }

    /// Gather every fact and attach the given preferences
    pub fn snapshot(&self, preferences: Preferences) -> FactSnapshot {
        FactSnapshot {
            facts: self.detect(),
            preferences,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn provider(temp: &TempDir, os: OperatingSystem) -> FactProvider {
        let mut config = Config::with_home(temp.path().join("home"));
        config.system_root = temp.path().join("root");
        config.search_path = Some(temp.path().join("bin").into_os_string());
        FactProvider::for_os(config, os)
    }

    #[test]
    fn test_detect_on_empty_machine() {
        let temp = TempDir::new().unwrap();
        let sheet = provider(&temp, OperatingSystem::Linux).detect();

        assert_eq!(sheet.operating_system, OperatingSystem::Linux);
        assert_eq!(sheet.installed, Installed::default());
    }

    #[test]
    fn test_failing_probe_only_empties_its_field() {
        let temp = TempDir::new().unwrap();
        let provider = provider(&temp, OperatingSystem::MacOs);
        let home = temp.path().join("home");
        fs::create_dir_all(home.join(".claude/plugins")).unwrap();
        fs::write(home.join(".claude/plugins/installed_plugins.json"), "{{{").unwrap();
        fs::write(home.join(".mcp.json"), r#"{"mcpServers": {"linear": {}}}"#).unwrap();

        let sheet = provider.detect();
        assert!(sheet.installed.plugins.is_empty());
        assert!(sheet.installed.mcps.contains("linear"));
    }

    #[test]
    fn test_has_any_is_case_insensitive() {
        let mut installed = Installed::default();
        installed.applications.insert("alfred".to_string());
        installed.mcps.insert("exa".to_string());

        assert!(installed.has_any(&["Alfred"]));
        assert!(installed.has_any(&["brave-search", "EXA"]));
        assert!(!installed.has_any(&["raycast"]));
    }

    #[test]
    fn test_snapshot_json_shape() {
        let temp = TempDir::new().unwrap();
        let mut prefs = Preferences::default();
        prefs.dismiss("husky-git-hooks");

        let snapshot = provider(&temp, OperatingSystem::Windows).snapshot(prefs);
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["os"], "windows");
        assert!(json["installed"]["cli_tools"].is_array());
        assert!(json["installed"]["mcps"].is_array());
        assert!(json["installed"]["applications"].is_array());
        assert!(json["installed"]["plugins"].is_array());
        assert_eq!(json["preferences"]["dismissed"][0], "husky-git-hooks");
        assert!(json["preferences"]["alternatives"].is_object());
        assert!(json.get("session_insights").is_none());
    }

    #[test]
    fn test_installed_accepts_nulls_and_missing_keys() {
        let installed: Installed =
            serde_json::from_str(r#"{"mcps": null, "cli_tools": ["git"]}"#).unwrap();
        assert!(installed.mcps.is_empty());
        assert!(installed.cli_tools.contains("git"));
        assert!(installed.plugins.is_empty());
    }
}
