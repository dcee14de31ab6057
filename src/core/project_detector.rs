/// Project type and framework detection
///
/// Looks only at the given directory, never its parents. Type comes from
/// language marker files; frameworks come from manifests and config files.

use crate::core::ProjectType;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Language marker files, most specific first
const LANGUAGE_MARKERS: &[(&str, ProjectType)] = &[
    ("tsconfig.json", ProjectType::Typescript),
    ("package.json", ProjectType::Javascript),
    ("pyproject.toml", ProjectType::Python),
    ("setup.py", ProjectType::Python),
    ("setup.cfg", ProjectType::Python),
    ("requirements.txt", ProjectType::Python),
    ("Pipfile", ProjectType::Python),
    ("Cargo.toml", ProjectType::Rust),
    ("go.mod", ProjectType::Go),
];

/// npm package name -> framework
const NODE_FRAMEWORKS: &[(&str, &str)] = &[
    ("react", "react"),
    ("next", "next"),
    ("vue", "vue"),
    ("nuxt", "nuxt"),
    ("svelte", "svelte"),
    ("@sveltejs/kit", "sveltekit"),
    ("@angular/core", "angular"),
    ("express", "express"),
    ("astro", "astro"),
    ("@remix-run/react", "remix"),
    ("solid-js", "solid"),
    ("vite", "vite"),
];

/// Config file prefix -> framework
const CONFIG_FRAMEWORKS: &[(&str, &str)] = &[
    ("next.config.", "next"),
    ("nuxt.config.", "nuxt"),
    ("vite.config.", "vite"),
    ("svelte.config.", "svelte"),
    ("astro.config.", "astro"),
    ("angular.json", "angular"),
];

const PYTHON_FRAMEWORKS: &[&str] = &["django", "flask", "fastapi"];

const RUST_FRAMEWORKS: &[&str] = &["axum", "actix-web", "rocket", "tauri"];

/// go.mod module path -> framework
const GO_FRAMEWORKS: &[(&str, &str)] = &[
    ("github.com/gin-gonic/gin", "gin"),
    ("github.com/labstack/echo", "echo"),
    ("github.com/gofiber/fiber", "fiber"),
];

/// Handles project type and framework detection
pub struct ProjectDetector;

impl ProjectDetector {
    /// Detect the project type of `dir`
    ///
    /// typescript subsumes javascript; any two other languages make the
    /// project `mixed`; no marker at all is `unknown`.
    pub fn detect_type<P: AsRef<Path>>(dir: P) -> ProjectType {
        let dir = dir.as_ref();

        let mut found: BTreeSet<ProjectType> = LANGUAGE_MARKERS
            .iter()
            .filter(|(marker, _)| dir.join(marker).is_file())
            .map(|(_, project_type)| *project_type)
            .collect();

        if found.contains(&ProjectType::Typescript) {
            found.remove(&ProjectType::Javascript);
        }

        let mut iter = found.into_iter();
        match (iter.next(), iter.next()) {
            (None, _) => ProjectType::Unknown,
            (Some(only), None) => only,
            (Some(_), Some(_)) => ProjectType::Mixed,
        }
    }

    /// Get all language markers found in a directory
    pub fn get_markers<P: AsRef<Path>>(dir: P) -> Vec<String> {
        let dir = dir.as_ref();

        LANGUAGE_MARKERS
            .iter()
            .filter(|(marker, _)| dir.join(marker).is_file())
            .map(|(marker, _)| marker.to_string())
            .collect()
    }

    /// Detect frameworks used in `dir`
    ///
    /// Independent of the project type; may return nothing.
    pub fn detect_frameworks<P: AsRef<Path>>(dir: P) -> BTreeSet<String> {
        let dir = dir.as_ref();
        let mut frameworks = BTreeSet::new();

        if let Some(manifest) = read_package_json(dir) {
            for (package, framework) in NODE_FRAMEWORKS {
                if has_node_dependency(&manifest, package) {
                    frameworks.insert(framework.to_string());
                }
            }
        }

        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let name = entry.file_name();
                let Some(name) = name.to_str() else {
                    continue;
                };
                for (prefix, framework) in CONFIG_FRAMEWORKS {
                    if name.starts_with(prefix) {
                        frameworks.insert(framework.to_string());
                    }
                }
            }
        }

        let python_sources = ["requirements.txt", "pyproject.toml", "Pipfile"]
            .iter()
            .filter_map(|file| fs::read_to_string(dir.join(file)).ok())
            .collect::<Vec<_>>()
            .join("\n")
            .to_lowercase();
        for framework in PYTHON_FRAMEWORKS {
            if python_sources.contains(framework) {
                frameworks.insert(framework.to_string());
            }
        }
        if dir.join("manage.py").is_file() {
            frameworks.insert("django".to_string());
        }

        if let Ok(cargo) = fs::read_to_string(dir.join("Cargo.toml")) {
            for framework in RUST_FRAMEWORKS {
                if has_cargo_dependency(&cargo, framework) {
                    frameworks.insert(framework.to_string());
                }
            }
        }

        if let Ok(go_mod) = fs::read_to_string(dir.join("go.mod")) {
            for (module, framework) in GO_FRAMEWORKS {
                if go_mod.contains(module) {
                    frameworks.insert(framework.to_string());
                }
            }
        }

        frameworks
    }
}

/// Parse `package.json` in `dir`
///
/// Missing or malformed manifests read as `None`.
pub(crate) fn read_package_json(dir: &Path) -> Option<Value> {
    let path = dir.join("package.json");
    let content = fs::read_to_string(&path).ok()?;

    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed package.json");
            None
        }
    }
}

/// Whether `package` appears in any dependency table of the manifest
pub(crate) fn has_node_dependency(manifest: &Value, package: &str) -> bool {
    ["dependencies", "devDependencies", "peerDependencies"]
        .iter()
        .any(|table| {
            manifest
                .get(table)
                .and_then(Value::as_object)
                .is_some_and(|deps| deps.contains_key(package))
        })
}

/// Line-based check for `name = ...` / `name.workspace = ...` in a Cargo manifest
fn has_cargo_dependency(cargo_toml: &str, name: &str) -> bool {
    cargo_toml.lines().any(|line| {
        let line = line.trim_start();
        line.strip_prefix(name)
            .and_then(|rest| rest.trim_start().chars().next())
            .is_some_and(|next| next == '=' || next == '.')
    })
}
