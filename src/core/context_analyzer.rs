/// Repository context analysis
///
/// Turns a directory into a `RepoContext`. Works on any directory,
/// including ones that are not projects or not git checkouts at all.

use crate::core::project_detector::{has_node_dependency, read_package_json};
use crate::core::{ProjectDetector, RepoContext, RepoSignals};
use git2::Repository;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Directories that hold tests
const TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "spec", "e2e"];

/// Files (or prefixes ending in '.') that configure a test runner
const TEST_CONFIGS: &[&str] = &[
    "pytest.ini",
    "conftest.py",
    "tox.ini",
    "jest.config.",
    "vitest.config.",
    "playwright.config.",
    "cypress.config.",
];

const CI_PATHS: &[&str] = &[
    ".github/workflows",
    ".gitlab-ci.yml",
    ".circleci",
    "Jenkinsfile",
    "azure-pipelines.yml",
    ".travis.yml",
    "bitbucket-pipelines.yml",
    ".buildkite",
];

const LINTER_CONFIGS: &[&str] = &[
    ".eslintrc",
    "eslint.config.",
    "biome.json",
    "biome.jsonc",
    ".oxlintrc.json",
    "ruff.toml",
    ".ruff.toml",
    ".flake8",
    ".pylintrc",
    "clippy.toml",
    ".clippy.toml",
    ".golangci.",
];

const HOOK_PATHS: &[&str] = &[
    ".husky",
    "lefthook.yml",
    "lefthook.yaml",
    ".lefthook.yml",
    ".lefthook.yaml",
    ".pre-commit-config.yaml",
];

/// Instruction files written for coding agents
const AGENT_DOCS: &[&str] = &[
    "AGENTS.md",
    "CLAUDE.md",
    ".cursorrules",
    ".github/copilot-instructions.md",
];

/// Context analyzer
pub struct ContextAnalyzer;

impl ContextAnalyzer {
    /// Analyze `dir`
    ///
    /// Never fails: anything unreadable counts as absent.
    pub fn analyze<P: AsRef<Path>>(dir: P) -> RepoContext {
        let dir = dir.as_ref();

        let project_type = ProjectDetector::detect_type(dir);
        let frameworks = ProjectDetector::detect_frameworks(dir);
        let signals = RepoSignals {
            has_tests: Self::detect_tests(dir),
            has_ci: Self::detect_ci(dir),
            has_linter: Self::detect_linter(dir),
            has_hooks: Self::detect_hooks(dir),
        };

        let has_agent_docs = Self::detect_agent_docs(dir);

        debug!(dir = %dir.display(), %project_type, ?signals, has_agent_docs, "analyzed directory");

        RepoContext::new(project_type, frameworks, signals).with_agent_docs(has_agent_docs)
    }

    /// Analyze the current working directory
    ///
    /// An unreadable cwd yields the unknown context.
    pub fn analyze_cwd() -> RepoContext {
        match std::env::current_dir() {
            Ok(cwd) => Self::analyze(cwd),
            Err(_) => RepoContext::unknown(),
        }
    }

    fn detect_tests(dir: &Path) -> bool {
        if TEST_DIRS.iter().any(|d| dir.join(d).is_dir()) || any_entry_matches(dir, TEST_CONFIGS) {
            return true;
        }

        // Go keeps tests next to the code
        if has_entry(dir, |name| name.ends_with("_test.go")) {
            return true;
        }

        read_package_json(dir)
            .and_then(|manifest| {
                manifest
                    .pointer("/scripts/test")
                    .and_then(|v| v.as_str())
                    .map(|script| !script.contains("no test specified"))
            })
            .unwrap_or(false)
    }

    fn detect_agent_docs(dir: &Path) -> bool {
        AGENT_DOCS.iter().any(|p| dir.join(p).is_file())
    }

    fn detect_ci(dir: &Path) -> bool {
        CI_PATHS.iter().any(|p| dir.join(p).exists())
    }

    fn detect_linter(dir: &Path) -> bool {
        if any_entry_matches(dir, LINTER_CONFIGS) {
            return true;
        }

        if let Ok(pyproject) = fs::read_to_string(dir.join("pyproject.toml")) {
            if ["[tool.ruff", "[tool.pylint", "[tool.flake8"]
                .iter()
                .any(|section| pyproject.contains(section))
            {
                return true;
            }
        }

        read_package_json(dir).is_some_and(|manifest| {
            manifest.get("eslintConfig").is_some()
                || ["eslint", "@biomejs/biome", "oxlint"]
                    .iter()
                    .any(|tool| has_node_dependency(&manifest, tool))
        })
    }

    fn detect_hooks(dir: &Path) -> bool {
        if HOOK_PATHS.iter().any(|p| dir.join(p).exists()) {
            return true;
        }

        if read_package_json(dir).is_some_and(|manifest| {
            manifest.get("simple-git-hooks").is_some()
                || has_node_dependency(&manifest, "husky")
                || has_node_dependency(&manifest, "lefthook")
        }) {
            return true;
        }

        Self::has_installed_git_hooks(dir)
    }

    /// Real (non-sample) hooks in the repository's hooks directory
    ///
    /// `Repository::open` does not search parent directories.
    fn has_installed_git_hooks(dir: &Path) -> bool {
        let repo = match Repository::open(dir) {
            Ok(repo) => repo,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "not a git checkout");
                return false;
            }
        };

        let hooks_dir = repo
            .config()
            .ok()
            .and_then(|config| config.get_path("core.hooksPath").ok())
            .map(|path| if path.is_absolute() { path } else { dir.join(path) })
            .unwrap_or_else(|| repo.path().join("hooks"));

        has_entry(&hooks_dir, |name| !name.ends_with(".sample"))
    }
}

/// Any entry in `dir` matching a pattern
///
/// `jest.config.` matches any extension; `.eslintrc` matches itself and
/// `.eslintrc.*`.
fn any_entry_matches(dir: &Path, patterns: &[&str]) -> bool {
    has_entry(dir, |name| {
        patterns.iter().any(|pattern| {
            if pattern.ends_with('.') {
                name.starts_with(pattern)
            } else {
                name == *pattern
                    || name
                        .strip_prefix(pattern)
                        .is_some_and(|rest| rest.starts_with('.'))
            }
        })
    })
}

fn has_entry<F: Fn(&str) -> bool>(dir: &Path, predicate: F) -> bool {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .any(|entry| entry.file_name().to_str().is_some_and(&predicate))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Gap, ProjectType};
    use tempfile::TempDir;

    #[test]
    fn test_empty_directory() {
        let temp = TempDir::new().unwrap();
        let ctx = ContextAnalyzer::analyze(temp.path());

        assert_eq!(ctx.project_type(), ProjectType::Unknown);
        assert_eq!(ctx.signals(), RepoSignals::default());
        for gap in Gap::ALL {
            assert!(ctx.has_gap(gap));
        }
    }

    #[test]
    fn test_missing_directory_is_unknown() {
        let temp = TempDir::new().unwrap();
        let ctx = ContextAnalyzer::analyze(temp.path().join("does-not-exist"));
        assert_eq!(ctx, RepoContext::unknown());
    }

    #[test]
    fn test_fully_equipped_node_project() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        fs::write(
            dir.join("package.json"),
            r#"{"scripts": {"test": "vitest"}, "dependencies": {"react": "18"}}"#,
        )
        .unwrap();
        fs::create_dir_all(dir.join(".github/workflows")).unwrap();
        fs::write(dir.join("eslint.config.js"), "").unwrap();
        fs::create_dir(dir.join(".husky")).unwrap();

        let ctx = ContextAnalyzer::analyze(dir);
        assert_eq!(ctx.project_type(), ProjectType::Javascript);
        assert!(ctx.has_framework(&["react"]));
        assert!(ctx.gaps().is_empty());
    }

    #[test]
    fn test_default_npm_test_script_is_not_tests() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("package.json"),
            r#"{"scripts": {"test": "echo \"Error: no test specified\" && exit 1"}}"#,
        )
        .unwrap();

        let ctx = ContextAnalyzer::analyze(temp.path());
        assert!(ctx.has_gap(Gap::NoTests));
    }

    #[test]
    fn test_python_signals() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        fs::write(dir.join("pyproject.toml"), "[tool.ruff]\nline-length = 100\n").unwrap();
        fs::write(dir.join("conftest.py"), "").unwrap();
        fs::write(dir.join(".pre-commit-config.yaml"), "repos: []\n").unwrap();

        let ctx = ContextAnalyzer::analyze(dir);
        assert_eq!(ctx.project_type(), ProjectType::Python);
        assert!(ctx.signals().has_linter);
        assert!(ctx.signals().has_tests);
        assert!(ctx.signals().has_hooks);
        assert_eq!(ctx.gaps().iter().copied().collect::<Vec<_>>(), vec![Gap::NoCi]);
    }

    #[test]
    fn test_go_tests_next_to_code() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("go.mod"), "module x\n").unwrap();
        fs::write(temp.path().join("main_test.go"), "package main\n").unwrap();

        assert!(ContextAnalyzer::analyze(temp.path()).signals().has_tests);
    }

    #[test]
    fn test_eslintrc_variants() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".eslintrc.json"), "{}").unwrap();
        assert!(ContextAnalyzer::analyze(temp.path()).signals().has_linter);
    }

    #[test]
    fn test_git_repo_without_hooks() {
        let temp = TempDir::new().unwrap();
        Repository::init(temp.path()).unwrap();

        // init only writes *.sample hooks
        assert!(!ContextAnalyzer::analyze(temp.path()).signals().has_hooks);
    }

    #[test]
    fn test_git_repo_with_installed_hook() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();
        let hooks = repo.path().join("hooks");
        fs::create_dir_all(&hooks).unwrap();
        fs::write(hooks.join("pre-commit"), "#!/bin/sh\n").unwrap();

        assert!(ContextAnalyzer::analyze(temp.path()).signals().has_hooks);
    }

    #[test]
    fn test_subdirectory_of_repo_is_not_a_checkout() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();
        fs::write(repo.path().join("hooks").join("pre-push"), "#!/bin/sh\n").ok();
        let sub = temp.path().join("nested");
        fs::create_dir(&sub).unwrap();

        assert!(!ContextAnalyzer::analyze(&sub).signals().has_hooks);
    }

    #[test]
    fn test_agent_docs_are_tracked_apart_from_gaps() {
        let temp = TempDir::new().unwrap();
        assert!(!ContextAnalyzer::analyze(temp.path()).has_agent_docs());

        fs::write(temp.path().join("AGENTS.md"), "# Agents\n").unwrap();
        let ctx = ContextAnalyzer::analyze(temp.path());
        assert!(ctx.has_agent_docs());
        assert_eq!(ctx.gaps().len(), 4);

        let copilot = TempDir::new().unwrap();
        fs::create_dir(copilot.path().join(".github")).unwrap();
        fs::write(copilot.path().join(".github/copilot-instructions.md"), "").unwrap();
        assert!(ContextAnalyzer::analyze(copilot.path()).has_agent_docs());
    }
}
