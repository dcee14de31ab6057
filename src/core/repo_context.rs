/// Project-level facts
///
/// `gaps` is derived from the four signals and cannot be set on its own.
/// Agent instruction files are tracked separately and never produce a gap.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Project type detected from marker files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    #[serde(alias = "node")]
    Javascript,
    Typescript,
    Python,
    Rust,
    Go,
    Mixed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ProjectType {
    pub fn name(&self) -> &str {
        match self {
            ProjectType::Javascript => "javascript",
            ProjectType::Typescript => "typescript",
            ProjectType::Python => "python",
            ProjectType::Rust => "rust",
            ProjectType::Go => "go",
            ProjectType::Mixed => "mixed",
            ProjectType::Unknown => "unknown",
        }
    }

    /// Node-based projects (javascript or typescript)
    pub fn is_node(&self) -> bool {
        matches!(self, ProjectType::Javascript | ProjectType::Typescript)
    }
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A missing piece of the development workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gap {
    NoTests,
    NoCi,
    NoLinter,
    NoGitHooks,
}

impl Gap {
    pub const ALL: [Gap; 4] = [Gap::NoTests, Gap::NoCi, Gap::NoLinter, Gap::NoGitHooks];

    pub fn id(&self) -> &str {
        match self {
            Gap::NoTests => "no_tests",
            Gap::NoCi => "no_ci",
            Gap::NoLinter => "no_linter",
            Gap::NoGitHooks => "no_git_hooks",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|gap| gap.id() == id)
    }
}

/// The four observed workflow signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepoSignals {
    pub has_tests: bool,
    pub has_ci: bool,
    pub has_linter: bool,
    pub has_hooks: bool,
}

impl RepoSignals {
    /// Signal that closes `gap`
    pub fn closes(&self, gap: Gap) -> bool {
        match gap {
            Gap::NoTests => self.has_tests,
            Gap::NoCi => self.has_ci,
            Gap::NoLinter => self.has_linter,
            Gap::NoGitHooks => self.has_hooks,
        }
    }

    /// Every gap entailed by a false signal
    pub fn gaps(&self) -> BTreeSet<Gap> {
        Gap::ALL
            .into_iter()
            .filter(|gap| !self.closes(*gap))
            .collect()
    }
}

/// Everything the analyzer learned about a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RepoContextInput")]
pub struct RepoContext {
    #[serde(rename = "type")]
    project_type: ProjectType,
    frameworks: BTreeSet<String>,
    #[serde(flatten)]
    signals: RepoSignals,
    has_agent_docs: bool,
    gaps: BTreeSet<Gap>,
}

impl RepoContext {
    pub fn new(project_type: ProjectType, frameworks: BTreeSet<String>, signals: RepoSignals) -> Self {
        Self {
            project_type,
            frameworks,
            gaps: signals.gaps(),
            signals,
            has_agent_docs: false,
        }
    }

    /// Record whether agent instruction files (AGENTS.md and friends) exist
    pub fn with_agent_docs(mut self, has_agent_docs: bool) -> Self {
        self.has_agent_docs = has_agent_docs;
        self
    }

    /// Context of a directory with no recognizable project in it
    pub fn unknown() -> Self {
        Self::new(ProjectType::Unknown, BTreeSet::new(), RepoSignals::default())
    }

    pub fn project_type(&self) -> ProjectType {
        self.project_type
    }

    pub fn frameworks(&self) -> &BTreeSet<String> {
        &self.frameworks
    }

    pub fn signals(&self) -> RepoSignals {
        self.signals
    }

    pub fn has_agent_docs(&self) -> bool {
        self.has_agent_docs
    }

    pub fn gaps(&self) -> &BTreeSet<Gap> {
        &self.gaps
    }

    pub fn has_gap(&self, gap: Gap) -> bool {
        self.gaps.contains(&gap)
    }

    pub fn has_framework(&self, names: &[&str]) -> bool {
        names
            .iter()
            .any(|name| self.frameworks.iter().any(|f| f.eq_ignore_ascii_case(name)))
    }
}

impl Default for RepoContext {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Lenient wire shape used when a context comes back in as JSON
///
/// A boolean that is absent is recovered from `gaps` when a gap list was
/// given, otherwise it is false. Gap ids we do not model are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RepoContextInput {
    #[serde(rename = "type", alias = "repo_type")]
    project_type: ProjectType,
    #[serde(deserialize_with = "crate::store::models::null_as_default")]
    frameworks: BTreeSet<String>,
    has_tests: Option<bool>,
    has_ci: Option<bool>,
    has_linter: Option<bool>,
    has_hooks: Option<bool>,
    has_agent_docs: bool,
    gaps: Option<Vec<String>>,
}

impl From<RepoContextInput> for RepoContext {
    fn from(input: RepoContextInput) -> Self {
        let listed: Option<BTreeSet<Gap>> = input
            .gaps
            .map(|ids| ids.iter().filter_map(|id| Gap::from_id(id)).collect());

        let signal = |explicit: Option<bool>, gap: Gap| -> bool {
            match (explicit, &listed) {
                (Some(value), _) => value,
                (None, Some(gaps)) => !gaps.contains(&gap),
                (None, None) => false,
            }
        };

        let signals = RepoSignals {
            has_tests: signal(input.has_tests, Gap::NoTests),
            has_ci: signal(input.has_ci, Gap::NoCi),
            has_linter: signal(input.has_linter, Gap::NoLinter),
            has_hooks: signal(input.has_hooks, Gap::NoGitHooks),
        };

        RepoContext::new(
            input.project_type,
            input.frameworks.iter().map(|f| f.to_lowercase()).collect(),
            signals,
        )
        .with_agent_docs(input.has_agent_docs)
    }
}
