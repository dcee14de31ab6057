/// Recommendation matcher
///
/// A pure function of (facts, context, preferences): no I/O, no clock, no
/// randomness. Output is ordered by category (catalog order) then id.

use crate::core::RepoContext;
use crate::facts::FactSheet;
use crate::intelligence::catalog::{Category, Recommendation, RecommendationCatalog};
use crate::store::Preferences;
use serde::{Deserialize, Serialize};

/// One recommendation that still applies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub recommendation_id: String,
    pub category: Category,
    pub suggested_tool: String,
    pub substituted: bool,
}

/// Why a relevant recommendation was left out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyInstalled,
    EquivalentInstalled { tool: String },
    Dismissed { alternative: Option<String> },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::AlreadyInstalled => write!(f, "already installed"),
            SkipReason::EquivalentInstalled { tool } => write!(f, "you have {} installed", tool),
            SkipReason::Dismissed { alternative: None } => write!(f, "dismissed"),
            SkipReason::Dismissed {
                alternative: Some(tool),
            } => write!(f, "dismissed, you use {} instead", tool),
        }
    }
}

/// A relevant recommendation that was not emitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecommendation {
    pub recommendation_id: String,
    pub category: Category,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Evaluates a catalog against one set of inputs
pub struct RecommendationMatcher<'a> {
    catalog: &'a [Recommendation],
    category: Option<Category>,
}

impl<'a> RecommendationMatcher<'a> {
    pub fn new(catalog: &'a [Recommendation]) -> Self {
        Self {
            catalog,
            category: None,
        }
    }

    /// Only keep recommendations from `category`
    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    /// Relevant recommendations that are neither installed nor dismissed
    pub fn matches(
        &self,
        facts: &FactSheet,
        context: &RepoContext,
        preferences: &Preferences,
    ) -> Vec<MatchResult> {
        let mut results: Vec<MatchResult> = self
            .relevant(facts, context)
            .into_iter()
            .filter(|rec| rec.installed_as(facts).is_none() && !preferences.is_dismissed(rec.id))
            .map(|rec| match preferences.alternative_for(rec.suggested_tool) {
                Some(alternative) => MatchResult {
                    recommendation_id: rec.id.to_string(),
                    category: rec.category,
                    suggested_tool: alternative.to_string(),
                    substituted: true,
                },
                None => MatchResult {
                    recommendation_id: rec.id.to_string(),
                    category: rec.category,
                    suggested_tool: rec.suggested_tool.to_string(),
                    substituted: false,
                },
            })
            .collect();

        results.sort_by(|a, b| {
            self.rank(a.category)
                .cmp(&self.rank(b.category))
                .then_with(|| a.recommendation_id.cmp(&b.recommendation_id))
        });

        results
    }

    /// Relevant recommendations left out, with the reason, in output order
    ///
    /// An installed tool takes precedence over a dismissal.
    pub fn skipped(
        &self,
        facts: &FactSheet,
        context: &RepoContext,
        preferences: &Preferences,
    ) -> Vec<SkippedRecommendation> {
        let mut skipped: Vec<SkippedRecommendation> = self
            .relevant(facts, context)
            .into_iter()
            .filter_map(|rec| {
                let reason = match rec.installed_as(facts) {
                    Some(tool) if tool == rec.suggested_tool => SkipReason::AlreadyInstalled,
                    Some(tool) => SkipReason::EquivalentInstalled {
                        tool: tool.to_string(),
                    },
                    None if preferences.is_dismissed(rec.id) => SkipReason::Dismissed {
                        alternative: preferences
                            .alternative_for(rec.suggested_tool)
                            .map(str::to_string),
                    },
                    None => return None,
                };

                Some(SkippedRecommendation {
                    recommendation_id: rec.id.to_string(),
                    category: rec.category,
                    reason,
                })
            })
            .collect();

        skipped.sort_by(|a, b| {
            self.rank(a.category)
                .cmp(&self.rank(b.category))
                .then_with(|| a.recommendation_id.cmp(&b.recommendation_id))
        });

        skipped
    }

    /// Entries in scope whose condition holds, installed or not
    fn relevant(&self, facts: &FactSheet, context: &RepoContext) -> Vec<&'a Recommendation> {
        let catalog: &'a [Recommendation] = self.catalog;
        catalog
            .iter()
            .filter(|rec| self.category.map_or(true, |only| rec.category == only))
            .filter(|rec| rec.relevant(facts, context))
            .collect()
    }

    /// Position of the first catalog entry in `category`
    fn rank(&self, category: Category) -> usize {
        self.catalog
            .iter()
            .position(|rec| rec.category == category)
            .unwrap_or(usize::MAX)
    }
}

impl RecommendationMatcher<'static> {
    /// Matcher over the built-in catalog
    pub fn builtin() -> Self {
        Self::new(RecommendationCatalog::builtin())
    }
}

/// Match against the built-in catalog
pub fn match_recommendations(
    facts: &FactSheet,
    context: &RepoContext,
    preferences: &Preferences,
) -> Vec<MatchResult> {
    RecommendationMatcher::builtin().matches(facts, context, preferences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Gap, ProjectType};
    use crate::facts::OperatingSystem;
    use crate::intelligence::MatchInput;

    fn scenario_facts() -> FactSheet {
        let mut facts = FactSheet::empty(OperatingSystem::Linux);
        facts.installed.cli_tools = ["git", "npm"].iter().map(|s| s.to_string()).collect();
        facts
    }

    fn scenario_context() -> RepoContext {
        serde_json::from_str(
            r#"{"type": "javascript", "frameworks": ["react"], "gaps": ["no_tests", "no_git_hooks"]}"#,
        )
        .unwrap()
    }

    fn ids(results: &[MatchResult]) -> Vec<&str> {
        results.iter().map(|r| r.recommendation_id.as_str()).collect()
    }

    #[test]
    fn test_js_project_without_tests_or_hooks() {
        let results = match_recommendations(
            &scenario_facts(),
            &scenario_context(),
            &Preferences::default(),
        );

        let hooks = results
            .iter()
            .find(|r| r.category == Category::VersionControlHooks)
            .unwrap();
        assert_eq!(hooks.recommendation_id, "husky-git-hooks");
        assert!(!hooks.substituted);

        let tests = results
            .iter()
            .find(|r| r.category == Category::Testing)
            .unwrap();
        assert!(!tests.substituted);

        assert!(ids(&results).contains(&"vitest-unit-tests"));
        assert!(!ids(&results).contains(&"oxlint-js-linting"));
        assert!(!ids(&results).contains(&"github-actions-ci"));
    }

    #[test]
    fn test_dismissed_recommendation_is_hidden() {
        let mut prefs = Preferences::default();
        prefs.dismiss("husky-git-hooks");

        let matcher = RecommendationMatcher::builtin();
        let results = matcher.matches(&scenario_facts(), &scenario_context(), &prefs);

        assert!(!ids(&results).contains(&"husky-git-hooks"));
        assert_eq!(
            matcher.skipped(&scenario_facts(), &scenario_context(), &prefs),
            vec![SkippedRecommendation {
                recommendation_id: "husky-git-hooks".to_string(),
                category: Category::VersionControlHooks,
                reason: SkipReason::Dismissed { alternative: None },
            }]
        );
    }

    #[test]
    fn test_alternative_substitutes_tool() {
        let mut prefs = Preferences::default();
        prefs.set_alternative("husky", "lefthook");

        let results = match_recommendations(&scenario_facts(), &scenario_context(), &prefs);
        let hooks = results
            .iter()
            .find(|r| r.recommendation_id == "husky-git-hooks")
            .unwrap();

        assert_eq!(hooks.suggested_tool, "lefthook");
        assert!(hooks.substituted);
        assert!(results
            .iter()
            .filter(|r| r.recommendation_id != "husky-git-hooks")
            .all(|r| !r.substituted));
    }

    #[test]
    fn test_installed_equivalent_suppresses() {
        let mut facts = scenario_facts();
        facts.installed.cli_tools.insert("lefthook".to_string());

        let results = match_recommendations(&facts, &scenario_context(), &Preferences::default());
        assert!(!ids(&results).contains(&"husky-git-hooks"));
    }

    #[test]
    fn test_ordering_is_category_then_id() {
        let results = match_recommendations(
            &FactSheet::empty(OperatingSystem::MacOs),
            &scenario_context(),
            &Preferences::default(),
        );

        let keys: Vec<(Category, &str)> = results
            .iter()
            .map(|r| (r.category, r.recommendation_id.as_str()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(results.first().unwrap().category, Category::Testing);
        assert_eq!(results.last().unwrap().category, Category::Applications);
    }

    #[test]
    fn test_deterministic() {
        let input = MatchInput::parse(
            r#"{"os": "macos", "installed": {"mcps": ["exa"]}, "context": {"repo": {"type": "python"}}}"#,
        )
        .unwrap();

        let first = match_recommendations(&input.facts, &input.context, &input.preferences);
        let second = match_recommendations(&input.facts, &input.context, &input.preferences);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert!(!ids(&first).contains(&"exa-web-search"));
    }

    #[test]
    fn test_no_gaps_no_project_recommendations() {
        let context: RepoContext = serde_json::from_str(
            r#"{"type": "rust", "has_tests": true, "has_ci": true, "has_linter": true, "has_hooks": true}"#,
        )
        .unwrap();
        assert!(context.gaps().is_empty());

        let results = match_recommendations(
            &FactSheet::empty(OperatingSystem::Linux),
            &context,
            &Preferences::default(),
        );
        assert!(results.iter().all(|r| !matches!(
            r.category,
            Category::Testing | Category::Linting | Category::VersionControlHooks | Category::Ci
        )));
    }

    #[test]
    fn test_category_filter() {
        let results = RecommendationMatcher::builtin()
            .with_category(Some(Category::Testing))
            .matches(&scenario_facts(), &scenario_context(), &Preferences::default());

        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.category == Category::Testing));
    }

    #[test]
    fn test_custom_catalog_uses_declaration_order() {
        fn always(_: &FactSheet, _: &RepoContext) -> bool {
            true
        }
        fn no_ci(_: &FactSheet, ctx: &RepoContext) -> bool {
            ctx.has_gap(Gap::NoCi)
        }

        let catalog = [
            Recommendation {
                id: "b-tool",
                category: Category::Tooling,
                suggested_tool: "b",
                equivalents: &[],
                condition: always,
            },
            Recommendation {
                id: "a-ci",
                category: Category::Ci,
                suggested_tool: "ci",
                equivalents: &[],
                condition: no_ci,
            },
            Recommendation {
                id: "a-tool",
                category: Category::Tooling,
                suggested_tool: "a",
                equivalents: &[],
                condition: always,
            },
        ];

        let context = RepoContext::new(ProjectType::Go, Default::default(), Default::default());
        let results = RecommendationMatcher::new(&catalog).matches(
            &FactSheet::empty(OperatingSystem::Linux),
            &context,
            &Preferences::default(),
        );
        assert_eq!(ids(&results), vec!["a-tool", "b-tool", "a-ci"]);
    }

    #[test]
    fn test_serialized_row() {
        let row = MatchResult {
            recommendation_id: "jq-json".to_string(),
            category: Category::Tooling,
            suggested_tool: "jq".to_string(),
            substituted: false,
        };
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"recommendation_id":"jq-json","category":"tooling","suggested_tool":"jq","substituted":false}"#
        );
    }

    #[test]
    fn test_skip_reasons() {
        let mut facts = FactSheet::empty(OperatingSystem::MacOs);
        facts.installed.mcps = ["exa".to_string()].into_iter().collect();
        facts.installed.applications = ["Alfred".to_string()].into_iter().collect();

        let mut prefs = Preferences::default();
        prefs.dismiss("figma-design");
        prefs.set_alternative("figma", "sketch");
        prefs.dismiss("jq-json");
        // installed wins over dismissed
        prefs.dismiss("exa-web-search");

        let matcher = RecommendationMatcher::builtin();
        let skipped = matcher.skipped(&facts, &RepoContext::unknown(), &prefs);
        let reasons: Vec<(&str, String)> = skipped
            .iter()
            .map(|s| (s.recommendation_id.as_str(), s.reason.to_string()))
            .collect();

        assert_eq!(
            reasons,
            vec![
                ("exa-web-search", "already installed".to_string()),
                ("figma-design", "dismissed, you use sketch instead".to_string()),
                ("jq-json", "dismissed".to_string()),
                ("raycast-launcher", "you have alfred installed".to_string()),
            ]
        );

        let emitted = matcher.matches(&facts, &RepoContext::unknown(), &prefs);
        assert!(emitted
            .iter()
            .all(|r| skipped.iter().all(|s| s.recommendation_id != r.recommendation_id)));
    }

    #[test]
    fn test_skipped_respects_category_filter() {
        let mut prefs = Preferences::default();
        prefs.dismiss("jq-json");
        prefs.dismiss("husky-git-hooks");

        let skipped = RecommendationMatcher::builtin()
            .with_category(Some(Category::Tooling))
            .skipped(&scenario_facts(), &scenario_context(), &prefs);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].recommendation_id, "jq-json");
    }

    #[test]
    fn test_skipped_row_serializes_reason() {
        let row = SkippedRecommendation {
            recommendation_id: "raycast-launcher".to_string(),
            category: Category::Applications,
            reason: SkipReason::EquivalentInstalled {
                tool: "alfred".to_string(),
            },
        };
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            serde_json::json!({
                "recommendation_id": "raycast-launcher",
                "category": "applications",
                "reason": "equivalent_installed",
                "tool": "alfred"
            })
        );
    }
}
