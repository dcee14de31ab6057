/// Individual fact probes
///
/// Each probe contributes one field of the fact sheet. A probe may fail;
/// the provider turns that failure into an empty set.

use crate::config::Config;
use crate::facts::OperatingSystem;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Command-line tools the catalog knows how to reason about
pub const KNOWN_CLI_TOOLS: &[&str] = &[
    "git", "gh", "jq", "fzf", "rg", "fd", "bat", "node", "npm", "pnpm", "yarn", "bun", "deno",
    "python3", "pip", "uv", "ruff", "pytest", "cargo", "cargo-nextest", "go", "docker",
    "lefthook", "husky", "pre-commit", "eslint", "biome", "oxlint", "prettier", "vitest", "jest",
    "poetry", "flake8", "pylint", "golangci-lint", "playwright", "cypress", "watchexec", "nodemon",
    "cargo-watch", "tldr", "tealdeer", "ast-grep", "sg",
];

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// The fixed, enumerable set of probes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    CliTools,
    Mcps,
    Applications,
    Plugins,
}

impl Probe {
    pub const ALL: [Probe; 4] = [
        Probe::CliTools,
        Probe::Mcps,
        Probe::Applications,
        Probe::Plugins,
    ];

    pub fn name(&self) -> &str {
        match self {
            Probe::CliTools => "cli_tools",
            Probe::Mcps => "mcps",
            Probe::Applications => "applications",
            Probe::Plugins => "plugins",
        }
    }

    /// Run this probe
    ///
    /// # Returns
    /// * `Ok(set)` - Lower-cased names found by the probe
    /// * `Err(e)` - The probe failed; the caller degrades to an empty set
    pub fn run(&self, os: OperatingSystem, config: &Config) -> std::io::Result<BTreeSet<String>> {
        match self {
            Probe::CliTools => Ok(detect_cli_tools(config)),
            Probe::Mcps => Ok(detect_mcps(config)),
            Probe::Applications => detect_applications(os, config),
            Probe::Plugins => match &config.plugin_registry_path {
                Some(registry) => detect_plugins(registry),
                None => Ok(BTreeSet::new()),
            },
        }
    }
}

/// Check which known tools resolve on the search path
fn detect_cli_tools(config: &Config) -> BTreeSet<String> {
    let search_path = config
        .search_path
        .clone()
        .or_else(|| std::env::var_os("PATH"));
    let Some(search_path) = search_path else {
        return BTreeSet::new();
    };
    let cwd = std::env::current_dir().unwrap_or_else(|_| config.system_root.clone());

    KNOWN_CLI_TOOLS
        .iter()
        .filter(|tool| which::which_in(tool, Some(&search_path), &cwd).is_ok())
        .map(|tool| tool.to_string())
        .collect()
}

/// Collect server names from every configured MCP file
///
/// Every file is its own source: one broken file does not hide the others.
fn detect_mcps(config: &Config) -> BTreeSet<String> {
    let mut servers = BTreeSet::new();

    for path in &config.mcp_config_paths {
        match read_mcp_servers(path) {
            Ok(found) => {
                debug!(path = %path.display(), count = found.len(), "read mcp config");
                servers.extend(found);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "ignoring unreadable mcp config"),
        }
    }

    servers
}

fn read_mcp_servers(path: &Path) -> std::io::Result<BTreeSet<String>> {
    let Some(root) = read_json(path)? else {
        return Ok(BTreeSet::new());
    };

    Ok(root
        .get("mcpServers")
        .and_then(Value::as_object)
        .map(|servers| servers.keys().map(|k| k.to_lowercase()).collect())
        .unwrap_or_default())
}

/// Read plugin identifiers from the host registry
///
/// Keys look like `name@marketplace`; only the name is kept.
fn detect_plugins(registry: &Path) -> std::io::Result<BTreeSet<String>> {
    let Some(root) = read_json(registry)? else {
        return Ok(BTreeSet::new());
    };

    let plugin_name = |raw: &str| -> String {
        raw.split('@').next().unwrap_or(raw).trim().to_lowercase()
    };

    let names: BTreeSet<String> = match root.get("plugins") {
        Some(Value::Object(map)) => map.keys().map(|k| plugin_name(k)).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(plugin_name(s)),
                Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(plugin_name),
                _ => None,
            })
            .collect(),
        _ => BTreeSet::new(),
    };

    Ok(names.into_iter().filter(|n| !n.is_empty()).collect())
}

/// Enumerate installed applications for the OS
fn detect_applications(os: OperatingSystem, config: &Config) -> std::io::Result<BTreeSet<String>> {
    if !os.lists_applications() {
        return Ok(BTreeSet::new());
    }

    let suffix = match os {
        OperatingSystem::MacOs => ".app",
        _ => ".desktop",
    };

    let mut apps = BTreeSet::new();
    for dir in config.application_dirs(os) {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };

        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if let Some(stem) = name.strip_suffix(suffix) {
                if let Some(app) = normalize_app_name(stem) {
                    apps.insert(app);
                }
            }
        }
    }

    Ok(apps)
}

/// `"Visual Studio Code"` -> `visual-studio-code`, `org.gnome.Nautilus` -> `nautilus`
pub fn normalize_app_name(raw: &str) -> Option<String> {
    let base = if raw.contains(' ') {
        raw
    } else {
        raw.rsplit('.').next().unwrap_or(raw)
    };

    let lowered = base.to_lowercase();
    let normalized = NON_ALNUM.replace_all(&lowered, "-");
    let normalized = normalized.trim_matches('-');

    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_string())
    }
}

/// Read a JSON file; a missing file is `Ok(None)`, a malformed one an error
fn read_json(path: &Path) -> std::io::Result<Option<Value>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))
}
