/// Matcher input document
///
/// `{ os?, installed, context, repo?, session_insights?, preferences }`.
/// The context may be a bare `RepoContext` or wrapped as `{ "repo": ... }`.
/// A top-level `repo` is also read, so the merged output of `detect` and
/// `analyze` can be piped straight in; when both `context` and `repo` are
/// given they must agree. Missing or null sections read as empty; anything
/// of the wrong shape is a `Parse` error.

use crate::core::RepoContext;
use crate::error::{FluxError, Result};
use crate::facts::{FactSheet, Installed, OperatingSystem, SessionInsights};
use crate::store::models::null_as_default;
use crate::store::Preferences;
use serde::de::Error as _;
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;

/// Parsed and normalized matcher input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchInput {
    pub facts: FactSheet,
    pub context: RepoContext,
    pub preferences: Preferences,
}

#[derive(Debug, Deserialize)]
struct RawInput {
    #[serde(default)]
    os: Option<OperatingSystem>,
    #[serde(default, deserialize_with = "null_as_default")]
    installed: Installed,
    #[serde(default)]
    context: Value,
    #[serde(default)]
    repo: Value,
    #[serde(default)]
    session_insights: Option<SessionInsights>,
    #[serde(default, deserialize_with = "null_as_default")]
    preferences: Preferences,
}

impl MatchInput {
    pub fn parse(input: &str) -> Result<Self> {
        let raw: RawInput = serde_json::from_str(input).map_err(FluxError::Parse)?;
        Self::from_raw(raw)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let raw: RawInput = serde_json::from_reader(reader).map_err(FluxError::Parse)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawInput) -> Result<Self> {
        let wrapped = match raw.context {
            Value::Object(mut map) if map.contains_key("repo") => {
                map.remove("repo").unwrap_or(Value::Null)
            }
            other => other,
        };

        let context = match (repo_context(wrapped)?, repo_context(raw.repo)?) {
            (Some(context), Some(repo)) if context != repo => {
                return Err(FluxError::Parse(serde_json::Error::custom(
                    "`context` and top-level `repo` describe different repositories",
                )));
            }
            (Some(context), _) => context,
            (None, Some(repo)) => repo,
            (None, None) => RepoContext::unknown(),
        };

        Ok(Self {
            facts: FactSheet {
                operating_system: raw.os.unwrap_or_else(OperatingSystem::current),
                installed: raw.installed,
                session_insights: raw.session_insights,
            },
            context,
            preferences: raw.preferences,
        })
    }
}

/// `None` for an absent or null repository section
fn repo_context(value: Value) -> Result<Option<RepoContext>> {
    match value {
        Value::Null => Ok(None),
        other => serde_json::from_value(other)
            .map(Some)
            .map_err(FluxError::Parse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Gap, ProjectType};
    use crate::facts::SessionSignal;
    use crate::intelligence::match_recommendations;

    #[test]
    fn test_wrapped_context() {
        let input = MatchInput::parse(
            r#"{
                "os": "macos",
                "installed": {"cli_tools": ["git", "npm"]},
                "context": {"repo": {"type": "javascript", "frameworks": ["react"], "gaps": ["no_tests"]}},
                "preferences": {"dismissed": ["exa-web-search"], "alternatives": {}}
            }"#,
        )
        .unwrap();

        assert_eq!(input.facts.operating_system, OperatingSystem::MacOs);
        assert!(input.facts.installed.cli_tools.contains("npm"));
        assert_eq!(input.context.project_type(), ProjectType::Javascript);
        assert!(input.context.has_gap(Gap::NoTests));
        assert!(input.preferences.is_dismissed("exa-web-search"));
    }

    #[test]
    fn test_flat_context() {
        let input =
            MatchInput::parse(r#"{"context": {"type": "rust", "has_tests": true}}"#).unwrap();
        assert_eq!(input.context.project_type(), ProjectType::Rust);
        assert!(!input.context.has_gap(Gap::NoTests));
        assert!(input.context.has_gap(Gap::NoCi));
    }

    #[test]
    fn test_empty_object_is_all_defaults() {
        let input = MatchInput::parse("{}").unwrap();
        assert_eq!(input.context, RepoContext::unknown());
        assert_eq!(input.facts.installed, Installed::default());
        assert!(input.preferences.is_empty());
        assert_eq!(input.facts.operating_system, OperatingSystem::current());
    }

    #[test]
    fn test_nulls_are_empty() {
        let input = MatchInput::parse(
            r#"{"installed": null, "context": {"repo": null}, "preferences": null}"#,
        )
        .unwrap();
        assert_eq!(input.context, RepoContext::unknown());
        assert!(input.preferences.is_empty());
    }

    #[test]
    fn test_bad_shapes_are_parse_errors() {
        for bad in [
            "not json",
            "[1, 2]",
            r#"{"installed": {"cli_tools": 3}}"#,
            r#"{"context": {"repo": {"frameworks": "react"}}}"#,
            r#"{"context": 7}"#,
            r#"{"os": "beos"}"#,
            r#"{"repo": "javascript"}"#,
            r#"{"session_insights": {"tool_errors": {"total": "many"}}}"#,
        ] {
            assert!(
                matches!(MatchInput::parse(bad), Err(FluxError::Parse(_))),
                "accepted {}",
                bad
            );
        }
    }

    #[test]
    fn test_from_reader() {
        let input = MatchInput::from_reader(r#"{"os": "linux"}"#.as_bytes()).unwrap();
        assert_eq!(input.facts.operating_system, OperatingSystem::Linux);
    }

    #[test]
    fn test_detect_and_analyze_union() {
        let input = MatchInput::parse(
            r#"{
                "os": "linux",
                "installed": {"cli_tools": ["git", "npm"], "mcps": [], "applications": [], "plugins": []},
                "preferences": {"dismissed": [], "alternatives": {}},
                "repo": {
                    "type": "javascript",
                    "frameworks": ["react"],
                    "has_tests": true,
                    "has_ci": false,
                    "has_linter": false,
                    "has_hooks": false,
                    "gaps": ["no_ci", "no_linter", "no_git_hooks"]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(input.context.project_type(), ProjectType::Javascript);
        assert!(!input.context.has_gap(Gap::NoTests));
        assert!(input.context.has_gap(Gap::NoGitHooks));

        let results = match_recommendations(&input.facts, &input.context, &input.preferences);
        let ids: Vec<&str> = results.iter().map(|r| r.recommendation_id.as_str()).collect();
        assert!(ids.contains(&"husky-git-hooks"));
        assert!(ids.contains(&"oxlint-js-linting"));
        assert!(ids.contains(&"github-actions-ci"));
        assert!(!ids.contains(&"vitest-unit-tests"));
    }

    #[test]
    fn test_context_and_repo_must_agree() {
        let same = MatchInput::parse(
            r#"{"context": {"repo": {"type": "go"}}, "repo": {"type": "go"}}"#,
        )
        .unwrap();
        assert_eq!(same.context.project_type(), ProjectType::Go);

        let null_context =
            MatchInput::parse(r#"{"context": null, "repo": {"type": "python"}}"#).unwrap();
        assert_eq!(null_context.context.project_type(), ProjectType::Python);

        assert!(matches!(
            MatchInput::parse(r#"{"context": {"type": "go"}, "repo": {"type": "rust"}}"#),
            Err(FluxError::Parse(_))
        ));
    }

    #[test]
    fn test_session_insights_section() {
        let input = MatchInput::parse(
            r#"{"session_insights": {"enabled": true, "tool_errors": {"total": 4}, "knowledge_gaps": {"by_type": {"cant_find": 2}}}}"#,
        )
        .unwrap();
        assert!(input.facts.has_session_signal(SessionSignal::RecurringToolErrors));
        assert!(input.facts.has_session_signal(SessionSignal::SearchDifficulties));
        assert!(!input.facts.has_session_signal(SessionSignal::FrequentLookups));

        let absent = MatchInput::parse(r#"{"session_insights": null}"#).unwrap();
        assert_eq!(absent.facts.session_insights, None);
    }
}
