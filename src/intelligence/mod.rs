/// Intelligence module
///
/// The recommendation catalog, the matcher that evaluates it, and the
/// pipeline that feeds it live facts.

pub mod analyzer;
pub mod catalog;
pub mod input;
pub mod matcher;

pub use analyzer::{AnalysisReport, Analyzer};
pub use catalog::{Category, Recommendation, RecommendationCatalog};
pub use input::MatchInput;
pub use matcher::{
    match_recommendations, MatchResult, RecommendationMatcher, SkipReason, SkippedRecommendation,
};
