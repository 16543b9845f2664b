//! 弹性远端客户端：熔断器保护下的 AI 分析调用。
//!
//! # Resilient Remote Client Module
//!
//! Wraps the single unreliable network call — a chat-completion request
//! asking the AI provider to rank a task list — behind the circuit breaker.
//! Produces a bounded, validated set of [`AnalysisResult`]s or fails fast.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ResilientClient`] | Breaker-gated `analyze` entry point |
//! | [`prompt`] | Natural-language prompt construction |
//! | [`parse`] | Defensive response extraction and validation |
//!
//! Responses are never trusted: markdown fences are stripped, the first
//! well-formed JSON array is located by pattern matching, every field is
//! validated and clamped, and the result count is capped. A response with
//! no salvageable JSON degrades to a line-based reading of the raw text
//! before the client gives up entirely.
//!
//! [`AnalysisResult`]: crate::types::AnalysisResult

pub mod client;
pub mod parse;
pub mod prompt;

pub use client::{RemoteConfig, ResilientClient};
