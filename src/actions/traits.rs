use crate::schema::SchemaDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

/// Description of an action for the reasoning capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Run-scoped context handed to every action alongside its arguments.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub topic: String,
    pub schema: SchemaDescriptor,
}

impl RunContext {
    pub fn new(topic: impl Into<String>, schema: SchemaDescriptor) -> Self {
        Self {
            topic: topic.into(),
            schema,
        }
    }
}

/// Core action trait. Implement for any evidence-gathering capability.
pub trait Action: Send + Sync {
    /// Action name (used in LLM function calling)
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// JSON schema for arguments
    fn input_schema(&self) -> Value;

    /// Run the action. The returned text becomes the result turn content.
    fn invoke<'a>(
        &'a self,
        args: Value,
        ctx: &'a RunContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;

    /// Get the full spec for LLM registration
    fn spec(&self) -> ActionSpec {
        ActionSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.input_schema(),
        }
    }
}
