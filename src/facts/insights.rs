/// Session insights
///
/// Optional summary of past assistant sessions (tool errors, "don't know"
/// style phrases). Never detected locally: it only arrives through matcher
/// input. Each signal fires once its count reaches a fixed threshold.

use crate::store::models::null_as_default;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Tool errors at or above this count are recurring
const RECURRING_TOOL_ERRORS: u32 = 3;

/// `(knowledge gap type, threshold, signal)`
const KNOWLEDGE_GAP_THRESHOLDS: &[(&str, u32, SessionSignal)] = &[
    ("dont_know", 2, SessionSignal::KnowledgeGaps),
    ("cant_find", 2, SessionSignal::SearchDifficulties),
    ("how_to", 3, SessionSignal::FrequentLookups),
];

/// A workflow problem observed across sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSignal {
    RecurringToolErrors,
    KnowledgeGaps,
    SearchDifficulties,
    FrequentLookups,
}

impl SessionSignal {
    pub fn id(&self) -> &str {
        match self {
            SessionSignal::RecurringToolErrors => "recurring_tool_errors",
            SessionSignal::KnowledgeGaps => "knowledge_gaps",
            SessionSignal::SearchDifficulties => "search_difficulties",
            SessionSignal::FrequentLookups => "frequent_lookups",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolErrors {
    pub total: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeGaps {
    #[serde(deserialize_with = "null_as_default")]
    pub by_type: BTreeMap<String, u32>,
}

/// Session analysis summary
///
/// Unknown keys (friction signals and the like) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionInsights {
    pub enabled: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub tool_errors: ToolErrors,
    #[serde(deserialize_with = "null_as_default")]
    pub knowledge_gaps: KnowledgeGaps,
}

impl Default for SessionInsights {
    fn default() -> Self {
        Self {
            enabled: true,
            tool_errors: ToolErrors::default(),
            knowledge_gaps: KnowledgeGaps::default(),
        }
    }
}

impl SessionInsights {
    /// Every signal whose threshold is reached; nothing when disabled
    pub fn signals(&self) -> BTreeSet<SessionSignal> {
        let mut signals = BTreeSet::new();
        if !self.enabled {
            return signals;
        }

        if self.tool_errors.total >= RECURRING_TOOL_ERRORS {
            signals.insert(SessionSignal::RecurringToolErrors);
        }
        for (kind, threshold, signal) in KNOWLEDGE_GAP_THRESHOLDS {
            let count = self.knowledge_gaps.by_type.get(*kind).copied().unwrap_or(0);
            if count >= *threshold {
                signals.insert(*signal);
            }
        }

        signals
    }

    pub fn has(&self, signal: SessionSignal) -> bool {
        self.signals().contains(&signal)
    }
}
