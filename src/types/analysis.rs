//! Analysis output types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Priority analysis for a single task. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// 1 (least urgent) to 10 (most urgent).
    pub priority: u8,
    pub reasoning: String,
    /// 1-based position in the recommended execution order.
    pub suggested_order: usize,
    pub estimated_impact: ImpactLevel,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Coarse impact tier for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
}

impl ImpactLevel {
    /// Impact tier derived from a priority value.
    pub fn from_priority(priority: u8) -> Self {
        match priority {
            8..=u8::MAX => ImpactLevel::High,
            5..=7 => ImpactLevel::Medium,
            _ => ImpactLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactLevel::Low => "low",
            ImpactLevel::Medium => "medium",
            ImpactLevel::High => "high",
        }
    }
}

/// Full response of one `analyze_todos` call: per-task results ordered by
/// `suggested_order` ascending, plus counts by impact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub results: Vec<AnalysisResult>,
    pub summary: AnalysisSummary,
}

impl AnalysisResponse {
    /// Build a response from results, sorting by suggested order and
    /// recomputing the summary so the two never disagree.
    pub fn from_results(mut results: Vec<AnalysisResult>) -> Self {
        results.sort_by_key(|r| r.suggested_order);
        let summary = AnalysisSummary::tally(&results);
        Self { results, summary }
    }

    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            summary: AnalysisSummary::default(),
        }
    }
}

/// Counts by impact tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total: usize,
    pub high_impact: usize,
    pub medium_impact: usize,
    pub low_impact: usize,
}

impl AnalysisSummary {
    pub fn tally(results: &[AnalysisResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        for r in results {
            match r.estimated_impact {
                ImpactLevel::High => summary.high_impact += 1,
                ImpactLevel::Medium => summary.medium_impact += 1,
                ImpactLevel::Low => summary.low_impact += 1,
            }
        }
        summary
    }
}
