//! Defensive extraction of analysis results from free-text responses.

use crate::types::{AnalysisResult, ImpactLevel};
use crate::{Error, ErrorContext, Result};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Hard cap on results taken from one response.
pub const MAX_RESULTS: usize = 20;

const DEFAULT_PRIORITY: u8 = 5;
const DEFAULT_TAG: &str = "general";

// Stricter pattern first: an array of objects, tolerating one level of
// nesting inside each object. Falls back to the loosest bracket match.
static ARRAY_OF_OBJECTS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\s*\{[\s\S]*\}\s*\]").expect("static regex"));
static LOOSE_ARRAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[\s\S]*\]").expect("static regex"));

/// Interpret a raw provider response as analysis results.
///
/// Tries, in order: strip wrapper tokens, locate and parse a JSON array,
/// validate and clamp every element; on any parse failure, fall back to a
/// line-based reading of the raw text. Only a response with nothing
/// salvageable at all is an error.
pub fn parse_analysis(raw: &str, task_count: usize) -> Result<Vec<AnalysisResult>> {
    let cleaned = strip_wrappers(raw);

    if let Some(candidate) = extract_json_array(cleaned) {
        match serde_json::from_str::<serde_json::Value>(candidate) {
            Ok(serde_json::Value::Array(items)) => {
                let results: Vec<AnalysisResult> = items
                    .iter()
                    .take(MAX_RESULTS)
                    .enumerate()
                    .map(|(i, item)| validate_item(item, i))
                    .collect();
                if !results.is_empty() {
                    return Ok(results);
                }
                debug!("response JSON array was empty, using line fallback");
            }
            Ok(_) => debug!("extracted JSON was not an array, using line fallback"),
            Err(e) => debug!(error = %e, "JSON parse failed, using line fallback"),
        }
    }

    let fallback = line_fallback(cleaned);
    if fallback.is_empty() && task_count > 0 {
        warn!("provider response had no salvageable content");
        return Err(Error::remote_with_context(
            "unparsable provider response",
            ErrorContext::new()
                .with_source("response_parser")
                .with_details(cleaned.chars().take(120).collect::<String>()),
        ));
    }
    Ok(fallback)
}

/// Strip markdown fences and a leading "json" language token.
fn strip_wrappers(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

fn extract_json_array(text: &str) -> Option<&str> {
    ARRAY_OF_OBJECTS_RE
        .find(text)
        .or_else(|| LOOSE_ARRAY_RE.find(text))
        .map(|m| m.as_str())
}

/// Validate and clamp one array element. Never trusts any field: priority
/// is clamped to [1,10] (default 5), impact is restricted to its enum
/// (default medium), tags default to a single generic tag, a missing
/// suggested order becomes the positional index.
fn validate_item(item: &serde_json::Value, index: usize) -> AnalysisResult {
    let priority = item["priority"]
        .as_i64()
        .or_else(|| item["priority"].as_f64().map(|f| f as i64))
        .map(|p| p.clamp(1, 10) as u8)
        .unwrap_or(DEFAULT_PRIORITY);

    let reasoning = item["reasoning"]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("No reasoning provided")
        .to_string();

    let suggested_order = item["suggestedOrder"]
        .as_u64()
        .filter(|&o| o >= 1)
        .map(|o| o as usize)
        .unwrap_or(index + 1);

    let estimated_impact = match item["estimatedImpact"].as_str() {
        Some(s) if s.eq_ignore_ascii_case("high") => ImpactLevel::High,
        Some(s) if s.eq_ignore_ascii_case("low") => ImpactLevel::Low,
        _ => ImpactLevel::Medium,
    };

    let tags = item["tags"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|t| t.as_str())
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
        })
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| vec![DEFAULT_TAG.to_string()]);

    AnalysisResult {
        priority,
        reasoning,
        suggested_order,
        estimated_impact,
        tags,
        created_at: Utc::now(),
    }
}

/// Last-resort heuristic: one result per non-empty line of the raw text,
/// priorities descending from 10.
fn line_fallback(text: &str) -> Vec<AnalysisResult> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(MAX_RESULTS)
        .enumerate()
        .map(|(i, line)| {
            let priority = 10u8.saturating_sub(i as u8).max(1);
            AnalysisResult {
                priority,
                reasoning: format!("Derived from response line: {}", truncate(line, 80)),
                suggested_order: i + 1,
                estimated_impact: ImpactLevel::from_priority(priority),
                tags: vec![DEFAULT_TAG.to_string()],
                created_at: Utc::now(),
            }
        })
        .collect()
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}
