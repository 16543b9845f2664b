//! Deterministic fallback heuristic.

use crate::types::{AnalysisResponse, AnalysisResult, ImpactLevel, Task};
use chrono::{DateTime, Utc};

const COMPLETED_PRIORITY: u8 = 1;

/// Rank tasks without the AI provider. Pure and total: no I/O, and every
/// input (including the empty list) produces a response.
///
/// Completed tasks drop to the lowest priority tier. Pending tasks get a
/// priority inversely related to their age in days, so a task that has sat
/// untouched for a week ranks below one created today. Results are
/// re-sorted by priority and the suggested order reassigned post-sort.
pub fn fallback_analysis(tasks: &[Task], now: DateTime<Utc>) -> AnalysisResponse {
    let mut results: Vec<AnalysisResult> = tasks
        .iter()
        .map(|task| {
            let priority = score_task(task, now);
            AnalysisResult {
                priority,
                reasoning: reasoning_for(task, priority, now),
                suggested_order: 0, // reassigned after the sort
                estimated_impact: ImpactLevel::from_priority(priority),
                tags: vec![task.status.as_str().to_string()],
                created_at: now,
            }
        })
        .collect();

    // Stable sort: tasks with equal priority keep their input order, which
    // keeps the heuristic reproducible for identical inputs.
    results.sort_by(|a, b| b.priority.cmp(&a.priority));
    for (i, r) in results.iter_mut().enumerate() {
        r.suggested_order = i + 1;
    }

    let summary = crate::types::AnalysisSummary::tally(&results);
    AnalysisResponse { results, summary }
}

fn score_task(task: &Task, now: DateTime<Utc>) -> u8 {
    if task.is_completed() {
        return COMPLETED_PRIORITY;
    }
    let age_days = task.age_days(now);
    (10 - age_days).clamp(1, 10) as u8
}

fn reasoning_for(task: &Task, priority: u8, now: DateTime<Utc>) -> String {
    if task.is_completed() {
        "Task is already completed".to_string()
    } else {
        format!(
            "Pending task, {} day(s) old, heuristic priority {}",
            task.age_days(now),
            priority
        )
    }
}
