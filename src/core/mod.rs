/// Core repository analysis
///
/// Project type, frameworks and workflow signals for a directory.

pub mod context_analyzer;
pub mod project_detector;
pub mod repo_context;

pub use context_analyzer::ContextAnalyzer;
pub use project_detector::ProjectDetector;
pub use repo_context::{Gap, ProjectType, RepoContext, RepoSignals};
