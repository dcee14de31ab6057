/// Built-in recommendation catalog
///
/// Every entry pairs a condition over (facts, context) with the tool it
/// proposes. The condition only says whether the entry is relevant; an
/// entry whose tool or one of its `equivalents` is installed never applies.

use crate::core::{Gap, ProjectType, RepoContext};
use crate::facts::{FactSheet, OperatingSystem, SessionSignal};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::str::FromStr;
/// Predicate deciding whether a recommendation applies
pub type Condition = fn(&FactSheet, &RepoContext) -> bool;

/// Grouping label, declared in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Testing,
    Linting,
    VersionControlHooks,
    Ci,
    Documentation,
    Research,
    Planning,
    Design,
    Memory,
    Tooling,
    Applications,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Testing,
        Category::Linting,
        Category::VersionControlHooks,
        Category::Ci,
        Category::Documentation,
        Category::Research,
        Category::Planning,
        Category::Design,
        Category::Memory,
        Category::Tooling,
        Category::Applications,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Testing => "testing",
            Category::Linting => "linting",
            Category::VersionControlHooks => "version-control-hooks",
            Category::Ci => "ci",
            Category::Documentation => "documentation",
            Category::Research => "research",
            Category::Planning => "planning",
            Category::Design => "design",
            Category::Memory => "memory",
            Category::Tooling => "tooling",
            Category::Applications => "applications",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Category::ALL.iter().map(|c| c.name()).collect();
                format!("unknown category '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// One catalog entry
#[derive(Debug, Clone, Copy)]
pub struct Recommendation {
    pub id: &'static str,
    pub category: Category,
    pub suggested_tool: &'static str,
    /// Tools that fill the same need
    pub equivalents: &'static [&'static str],
    pub condition: Condition,
}

impl Recommendation {
    /// Relevant and nothing covering it is installed
    pub fn applies(&self, facts: &FactSheet, context: &RepoContext) -> bool {
        self.relevant(facts, context) && self.installed_as(facts).is_none()
    }

    pub fn relevant(&self, facts: &FactSheet, context: &RepoContext) -> bool {
        (self.condition)(facts, context)
    }

    /// The suggested tool if installed, else the first installed equivalent
    pub fn installed_as(&self, facts: &FactSheet) -> Option<&'static str> {
        std::iter::once(self.suggested_tool)
            .chain(self.equivalents.iter().copied())
            .find(|name| facts.installed.has_any(&[*name]))
    }
}

/// Frameworks that ship a browser UI worth end-to-end testing
const WEB_FRAMEWORKS: &[&str] = &[
    "react", "next", "vue", "nuxt", "svelte", "sveltekit", "angular", "astro", "remix", "solid",
];

static BUILTIN: &[Recommendation] = &[
    // testing
    Recommendation {
        id: "vitest-unit-tests",
        category: Category::Testing,
        suggested_tool: "vitest",
        equivalents: &["jest"],
        condition: node_without_tests,
    },
    Recommendation {
        id: "pytest-unit-tests",
        category: Category::Testing,
        suggested_tool: "pytest",
        equivalents: &[],
        condition: python_without_tests,
    },
    Recommendation {
        id: "cargo-nextest",
        category: Category::Testing,
        suggested_tool: "cargo-nextest",
        equivalents: &[],
        condition: rust_without_tests,
    },
    Recommendation {
        id: "stagehand-e2e",
        category: Category::Testing,
        suggested_tool: "stagehand",
        equivalents: &["playwright", "cypress"],
        condition: web_app_without_tests,
    },
    Recommendation {
        id: "recurring-errors-watch-mode",
        category: Category::Testing,
        suggested_tool: "watchexec",
        equivalents: &["nodemon", "cargo-watch"],
        condition: recurring_tool_errors,
    },
    // linting
    Recommendation {
        id: "oxlint-js-linting",
        category: Category::Linting,
        suggested_tool: "oxlint",
        equivalents: &["eslint", "biome"],
        condition: node_without_linter,
    },
    Recommendation {
        id: "ruff-python-linting",
        category: Category::Linting,
        suggested_tool: "ruff",
        equivalents: &["flake8", "pylint"],
        condition: python_without_linter,
    },
    Recommendation {
        id: "golangci-lint",
        category: Category::Linting,
        suggested_tool: "golangci-lint",
        equivalents: &[],
        condition: go_without_linter,
    },
    // version-control hooks
    Recommendation {
        id: "husky-git-hooks",
        category: Category::VersionControlHooks,
        suggested_tool: "husky",
        equivalents: &["lefthook", "pre-commit"],
        condition: node_without_hooks,
    },
    Recommendation {
        id: "pre-commit-hooks",
        category: Category::VersionControlHooks,
        suggested_tool: "pre-commit",
        equivalents: &["lefthook"],
        condition: python_without_hooks,
    },
    Recommendation {
        id: "lefthook-git-hooks",
        category: Category::VersionControlHooks,
        suggested_tool: "lefthook",
        equivalents: &["pre-commit", "husky"],
        condition: compiled_without_hooks,
    },
    // ci
    Recommendation {
        id: "github-actions-ci",
        category: Category::Ci,
        suggested_tool: "github-actions",
        equivalents: &[],
        condition: project_without_ci,
    },
    // documentation
    Recommendation {
        id: "agents-md-structure",
        category: Category::Documentation,
        suggested_tool: "agents-md",
        equivalents: &[],
        condition: no_agent_docs,
    },
    Recommendation {
        id: "context7-docs",
        category: Category::Documentation,
        suggested_tool: "context7",
        equivalents: &["deepwiki"],
        condition: always,
    },
    Recommendation {
        id: "frequent-lookups-cheatsheets",
        category: Category::Documentation,
        suggested_tool: "tldr",
        equivalents: &["tealdeer"],
        condition: frequent_lookups,
    },
    // research
    Recommendation {
        id: "exa-web-search",
        category: Category::Research,
        suggested_tool: "exa",
        equivalents: &["google-search", "brave-search", "perplexity"],
        condition: always,
    },
    Recommendation {
        id: "knowledge-gaps-research",
        category: Category::Research,
        suggested_tool: "perplexity",
        equivalents: &[],
        condition: knowledge_gaps,
    },
    // planning
    Recommendation {
        id: "linear-issue-tracking",
        category: Category::Planning,
        suggested_tool: "linear",
        equivalents: &["github", "jira"],
        condition: always,
    },
    Recommendation {
        id: "excalidraw-diagrams",
        category: Category::Planning,
        suggested_tool: "excalidraw",
        equivalents: &["mermaid"],
        condition: always,
    },
    // design
    Recommendation {
        id: "figma-design",
        category: Category::Design,
        suggested_tool: "figma",
        equivalents: &["pencil"],
        condition: always,
    },
    // memory
    Recommendation {
        id: "supermemory-context",
        category: Category::Memory,
        suggested_tool: "supermemory",
        equivalents: &["memory", "mem0"],
        condition: always,
    },
    // cli tooling
    Recommendation {
        id: "fzf-fuzzy-finder",
        category: Category::Tooling,
        suggested_tool: "fzf",
        equivalents: &[],
        condition: always,
    },
    Recommendation {
        id: "gh-cli",
        category: Category::Tooling,
        suggested_tool: "gh",
        equivalents: &[],
        condition: uses_git,
    },
    Recommendation {
        id: "jq-json",
        category: Category::Tooling,
        suggested_tool: "jq",
        equivalents: &[],
        condition: always,
    },
    Recommendation {
        id: "ripgrep-search",
        category: Category::Tooling,
        suggested_tool: "ripgrep",
        equivalents: &["rg"],
        condition: always,
    },
    Recommendation {
        id: "search-difficulties-ast-grep",
        category: Category::Tooling,
        suggested_tool: "ast-grep",
        equivalents: &["sg"],
        condition: search_difficulties,
    },
    Recommendation {
        id: "uv-python-packaging",
        category: Category::Tooling,
        suggested_tool: "uv",
        equivalents: &["poetry"],
        condition: python_project,
    },
    // applications
    Recommendation {
        id: "granola-meeting-notes",
        category: Category::Applications,
        suggested_tool: "granola",
        equivalents: &["otter"],
        condition: on_macos,
    },
    Recommendation {
        id: "raycast-launcher",
        category: Category::Applications,
        suggested_tool: "raycast",
        equivalents: &["alfred"],
        condition: on_macos,
    },
];

/// The fixed catalog shipped with the binary
pub struct RecommendationCatalog;

impl RecommendationCatalog {
    pub fn builtin() -> &'static [Recommendation] {
        BUILTIN
    }

    pub fn get(id: &str) -> Option<&'static Recommendation> {
        BUILTIN.iter().find(|rec| rec.id == id)
    }

    /// Best fuzzy match for a mistyped id
    pub fn closest_id(query: &str) -> Option<&'static str> {
        let matcher = SkimMatcherV2::default();

        BUILTIN
            .iter()
            .filter_map(|rec| matcher.fuzzy_match(rec.id, query).map(|score| (score, rec.id)))
            .max_by_key(|(score, id)| (*score, Reverse(*id)))
            .map(|(_, id)| id)
    }
}

fn is_type(context: &RepoContext, types: &[ProjectType]) -> bool {
    types.contains(&context.project_type())
}

fn always(_facts: &FactSheet, _context: &RepoContext) -> bool {
    true
}

fn node_without_tests(_facts: &FactSheet, context: &RepoContext) -> bool {
    context.has_gap(Gap::NoTests) && context.project_type().is_node()
}

fn python_without_tests(_facts: &FactSheet, context: &RepoContext) -> bool {
    context.has_gap(Gap::NoTests) && is_type(context, &[ProjectType::Python])
}

fn rust_without_tests(_facts: &FactSheet, context: &RepoContext) -> bool {
    context.has_gap(Gap::NoTests) && is_type(context, &[ProjectType::Rust])
}

fn web_app_without_tests(_facts: &FactSheet, context: &RepoContext) -> bool {
    context.has_gap(Gap::NoTests) && context.has_framework(WEB_FRAMEWORKS)
}

fn node_without_linter(_facts: &FactSheet, context: &RepoContext) -> bool {
    context.has_gap(Gap::NoLinter) && context.project_type().is_node()
}

fn python_without_linter(_facts: &FactSheet, context: &RepoContext) -> bool {
    context.has_gap(Gap::NoLinter) && is_type(context, &[ProjectType::Python])
}

fn go_without_linter(_facts: &FactSheet, context: &RepoContext) -> bool {
    context.has_gap(Gap::NoLinter) && is_type(context, &[ProjectType::Go])
}

fn node_without_hooks(_facts: &FactSheet, context: &RepoContext) -> bool {
    context.has_gap(Gap::NoGitHooks) && context.project_type().is_node()
}

fn python_without_hooks(_facts: &FactSheet, context: &RepoContext) -> bool {
    context.has_gap(Gap::NoGitHooks) && is_type(context, &[ProjectType::Python])
}

fn compiled_without_hooks(_facts: &FactSheet, context: &RepoContext) -> bool {
    context.has_gap(Gap::NoGitHooks)
        && is_type(context, &[ProjectType::Rust, ProjectType::Go, ProjectType::Mixed])
}

fn project_without_ci(_facts: &FactSheet, context: &RepoContext) -> bool {
    context.has_gap(Gap::NoCi) && context.project_type() != ProjectType::Unknown
}

fn no_agent_docs(_facts: &FactSheet, context: &RepoContext) -> bool {
    !context.has_agent_docs()
}

fn python_project(_facts: &FactSheet, context: &RepoContext) -> bool {
    is_type(context, &[ProjectType::Python])
}

fn uses_git(facts: &FactSheet, _context: &RepoContext) -> bool {
    facts.installed.has_any(&["git"])
}

fn on_macos(facts: &FactSheet, _context: &RepoContext) -> bool {
    facts.operating_system == OperatingSystem::MacOs
}

fn recurring_tool_errors(facts: &FactSheet, _context: &RepoContext) -> bool {
    facts.has_session_signal(SessionSignal::RecurringToolErrors)
}

fn knowledge_gaps(facts: &FactSheet, _context: &RepoContext) -> bool {
    facts.has_session_signal(SessionSignal::KnowledgeGaps)
}

fn search_difficulties(facts: &FactSheet, _context: &RepoContext) -> bool {
    facts.has_session_signal(SessionSignal::SearchDifficulties)
}

fn frequent_lookups(facts: &FactSheet, _context: &RepoContext) -> bool {
    facts.has_session_signal(SessionSignal::FrequentLookups)
}
