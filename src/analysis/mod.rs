pub mod generator;
pub mod prompts;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The analysis categories known to the intake workflow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisType {
    Market,
    Competitive,
    Risk,
    Technical,
    Financial,
    Solution,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 6] = [
        AnalysisType::Market,
        AnalysisType::Competitive,
        AnalysisType::Risk,
        AnalysisType::Technical,
        AnalysisType::Financial,
        AnalysisType::Solution,
    ];

    /// Display name used for page titles and the workspace multi-select values.
    pub fn display_name(&self) -> &'static str {
        match self {
            AnalysisType::Market => "Market Analysis",
            AnalysisType::Competitive => "Competitive Analysis",
            AnalysisType::Risk => "Risk Assessment",
            AnalysisType::Technical => "Technical Feasibility",
            AnalysisType::Financial => "Financial Overview",
            AnalysisType::Solution => "Solution Recommendations",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            AnalysisType::Market => "📊",
            AnalysisType::Competitive => "🏢",
            AnalysisType::Risk => "⚠️",
            AnalysisType::Technical => "⚙️",
            AnalysisType::Financial => "💰",
            AnalysisType::Solution => "💡",
        }
    }

    /// Stage label attached to LLM spans.
    pub fn stage(&self) -> &'static str {
        match self {
            AnalysisType::Market => "market",
            AnalysisType::Competitive => "competitive",
            AnalysisType::Risk => "risk",
            AnalysisType::Technical => "technical",
            AnalysisType::Financial => "financial",
            AnalysisType::Solution => "solution",
        }
    }

    /// Parses a workspace multi-select value or API request string.
    /// Accepts the display name or the short stage name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|ty| {
            lower == ty.display_name().to_lowercase() || lower == ty.stage()
        })
    }
}

/// Raw text produced by one analysis generator for one project.
/// Immutable once created; consumed by the block formatter exactly once.
#[derive(Debug, Clone)]
pub struct Report {
    pub project_name: String,
    pub analysis_type: AnalysisType,
    pub raw_text: String,
    pub generated_at: DateTime<Utc>,
}
