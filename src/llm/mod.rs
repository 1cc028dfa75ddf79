// ── Infrastructure ───────────────────────────────────────────────────────────
pub mod coercion;
pub mod http_client;
pub mod scrub;
pub mod traits;
pub mod types;

// ── Decorator layers ────────────────────────────────────────────────────────
pub mod factory;
pub mod reliable;

// ── Provider implementations ────────────────────────────────────────────────
pub mod openai;

// ── Infrastructure re-exports ───────────────────────────────────────────────
pub use coercion::{coerce_arguments, coerce_value};
pub use http_client::{build_provider_client, build_web_client};
pub use scrub::{api_error, sanitize_api_error, scrub_secret_patterns};
pub use traits::{Provider, ProviderCapabilities, messages_to_text};
pub use types::{
    ContentBlock, MessageRole, ProviderMessage, ProviderResponse, StopReason, ToolChoice,
};

// ── Provider + factory re-exports ───────────────────────────────────────────
pub use factory::{create_provider, create_resilient_provider};
pub use openai::OpenAiCompatibleProvider;
pub use reliable::ReliableProvider;
