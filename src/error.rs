use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `enricher`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum EnrichError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── LLM / Provider ──────────────────────────────────────────────────
    #[error("llm: {0}")]
    Llm(#[from] LlmError),

    // ── Actions ─────────────────────────────────────────────────────────
    #[error("action: {0}")]
    Action(#[from] ActionError),

    // ── Control loop ────────────────────────────────────────────────────
    #[error("loop: {0}")]
    Loop(#[from] LoopError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── LLM / Provider errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider {provider} has no API key configured")]
    MissingApiKey { provider: String },

    #[error("provider {provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("provider {provider} response could not be decoded: {message}")]
    Decode { provider: String, message: String },

    /// Upstream answered with a non-success status. `body` is already scrubbed.
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },
}

impl LlmError {
    /// Client errors that will not resolve by retrying. Rate limits and
    /// request timeouts are the retryable exceptions.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::MissingApiKey { .. } => true,
            Self::Api { status, .. } => {
                (400..500).contains(status) && *status != 429 && *status != 408
            }
            Self::Request { .. } | Self::Decode { .. } => false,
        }
    }
}

// ─── Action errors ──────────────────────────────────────────────────────────

/// Per-call action failures. These never escape the loop: their `Display`
/// text becomes the content of a `Failure` result turn.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Tool not found: {name}")]
    NotFound { name: String },

    #[error("Action {name} failed: {message}")]
    Failed { name: String, message: String },

    #[error("Action {name} timed out after {secs}s")]
    TimedOut { name: String, secs: u64 },

    #[error("Action {name} aborted unexpectedly: {message}")]
    Panicked { name: String, message: String },
}

// ─── Control loop errors ────────────────────────────────────────────────────

/// Errors that abort a run. Everything the model or an action can do wrong is
/// absorbed inside the loop; only these reach the caller of `run`.
#[derive(Debug, Error)]
pub enum LoopError {
    /// An invariant the controller itself maintains was broken.
    #[error("internal consistency error: {0}")]
    InternalConsistency(String),

    /// The reasoning capability failed for a reason other than a timeout.
    #[error("reasoning capability failed: {0}")]
    Reasoning(#[source] anyhow::Error),
}

impl LoopError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalConsistency(message.into())
    }
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, EnrichError>;
