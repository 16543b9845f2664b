use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "analyzer.cache_ttl")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected value, raw content excerpt)
    pub details: Option<String>,
    /// Source of the error (e.g., "circuit_breaker", "response_parser")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Unified error type for the taskmesh core.
///
/// Remote-call and sync failures are recovered at the boundary of the
/// component that owns the risk; only contract violations (malformed
/// configuration, serialization bugs) are expected to reach callers.
#[derive(Debug, Error)]
pub enum Error {
    /// The circuit breaker is open; the remote provider is not consulted.
    /// Callers should not retry immediately.
    #[error("AI service unavailable: circuit breaker open{}", format_retry(.retry_after_ms))]
    ServiceUnavailable { retry_after_ms: Option<u64> },

    /// The underlying provider call failed in transport or returned content
    /// that could not be salvaged into results.
    #[error("Remote call failed: {message}{}", format_context(.context))]
    RemoteCallFailed {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    /// The sync channel could not publish or receive. Logged by the channel
    /// itself; a node that cannot sync keeps serving local state.
    #[error("Sync delivery error: {message}{}", format_context(.context))]
    SyncDelivery {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

fn format_retry(retry_after_ms: &Option<u64>) -> String {
    match retry_after_ms {
        Some(ms) => format!(" (retry after {}ms)", ms),
        None => String::new(),
    }
}

impl Error {
    /// Create a new remote-call error with structured context
    pub fn remote_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::RemoteCallFailed {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Create a new sync-delivery error with structured context
    pub fn sync_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::SyncDelivery {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::RemoteCallFailed { context, .. }
            | Error::Configuration { context, .. }
            | Error::Validation { context, .. }
            | Error::SyncDelivery { context, .. } => Some(context),
            _ => None,
        }
    }

    /// True when the breaker rejected the call without a network attempt.
    pub fn is_breaker_open(&self) -> bool {
        matches!(self, Error::ServiceUnavailable { .. })
    }
}
