//! 弹性模块：熔断器保护不稳定的远端 AI 依赖。
//!
//! # Resilience Primitives Module
//!
//! Failure isolation for the one genuinely unreliable dependency in the
//! system: the remote AI provider. A flaky provider must degrade analysis
//! quality, never availability of the task service itself.
//!
//! ## Circuit Breaker
//!
//! The circuit breaker prevents repeated calls to a failing service:
//! - **Closed**: Normal operation, requests pass through
//! - **Open**: Failures reached threshold, requests fail fast
//! - **Half-Open**: A single probe tests whether the service recovered
//!
//! ```rust
//! use taskmesh::resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
//! use std::time::Duration;
//!
//! let config = CircuitBreakerConfig::new()
//!     .with_max_failures(3)
//!     .with_reset_timeout(Duration::from_secs(30));
//! let breaker = CircuitBreaker::new(config);
//!
//! if let Ok(permit) = breaker.allow() {
//!     // Make the provider call...
//!     permit.record_success();
//! }
//! assert_eq!(breaker.state(), CircuitState::Closed);
//! ```
//!
//! Every admitted call carries a [`CallPermit`]; dropping the permit without
//! recording an outcome releases the Half-Open probe slot, so a cancelled
//! probe cannot leave the breaker stuck.

pub mod circuit_breaker;

pub use circuit_breaker::{
    CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerSnapshot, CircuitState,
};
