/// Main analyzer orchestrator
///
/// Runs fact detection and repository analysis side by side, then feeds
/// both plus the stored preferences through the matcher.

use crate::config::Config;
use crate::core::{ContextAnalyzer, RepoContext};
use crate::error::Result;
use crate::facts::{FactProvider, FactSheet};
use crate::intelligence::{Category, MatchResult, RecommendationMatcher, SkippedRecommendation};
use crate::store::{PreferenceStore, Preferences};
use std::path::PathBuf;
use tracing::debug;

/// Main analyzer
pub struct Analyzer {
    config: Config,
    category: Option<Category>,
}

impl Analyzer {
    /// Create a new analyzer
    pub fn new(config: Config) -> Self {
        Self {
            config,
            category: None,
        }
    }

    /// Restrict the report to one category
    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    /// Run full analysis of `dir`
    pub async fn analyze(&self, dir: PathBuf) -> Result<AnalysisReport> {
        let provider = FactProvider::new(self.config.clone());

        let facts_task = tokio::task::spawn_blocking(move || provider.detect());
        let context_task = tokio::task::spawn_blocking(move || ContextAnalyzer::analyze(dir));
        let (facts, context) = tokio::try_join!(facts_task, context_task)?;

        let preferences = PreferenceStore::from_config(&self.config).list();

        let matcher = RecommendationMatcher::builtin().with_category(self.category);
        let results = matcher.matches(&facts, &context, &preferences);
        let skipped = matcher.skipped(&facts, &context, &preferences);

        debug!(
            results = results.len(),
            skipped = skipped.len(),
            "analysis finished"
        );

        Ok(AnalysisReport {
            facts,
            context,
            preferences,
            results,
            skipped,
        })
    }
}

/// Analysis report
#[derive(Debug)]
pub struct AnalysisReport {
    pub facts: FactSheet,
    pub context: RepoContext,
    pub preferences: Preferences,
    pub results: Vec<MatchResult>,
    /// Relevant entries left out because of an installed tool or a dismissal
    pub skipped: Vec<SkippedRecommendation>,
}

impl AnalysisReport {
    /// Results grouped by category, in output order
    pub fn grouped(&self) -> Vec<(Category, Vec<&MatchResult>)> {
        let mut groups: Vec<(Category, Vec<&MatchResult>)> = Vec::new();

        for result in &self.results {
            if let Some((category, rows)) = groups.last_mut() {
                if *category == result.category {
                    rows.push(result);
                    continue;
                }
            }
            groups.push((result.category, vec![result]));
        }

        groups
    }
}
