//! 核心类型定义：任务与分析结果。
//!
//! Core type definitions shared across the crate: the task record as the
//! storage layer hands it to us, and the analysis output types produced by
//! the remote client and the deterministic fallback.

pub mod analysis;
pub mod task;

pub use analysis::{AnalysisResponse, AnalysisResult, AnalysisSummary, ImpactLevel};
pub use task::{Task, TaskStatus};
