use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Caller-supplied structural description of the record being extracted.
///
/// The controller treats it as opaque: it becomes the input schema of the
/// synthetic `submit` action, is rendered into prompts, and is used to check
/// candidate records before they reach the judgment pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDescriptor(Value);

impl SchemaDescriptor {
    pub fn new(schema: Value) -> Self {
        Self(schema)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).context("parse target schema")?;
        Self::checked(value)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read schema {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("load schema {}", path.display()))
    }

    /// Wrap a value after confirming it compiles as a JSON Schema.
    pub fn checked(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(anyhow!("target schema must be a JSON object"));
        }
        jsonschema::validator_for(&value).map_err(|err| anyhow!("invalid schema: {err}"))?;
        Ok(Self(value))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Pretty JSON for prompt rendering.
    pub fn render(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| self.0.to_string())
    }

    /// Validate a candidate record. Returns one message per violation.
    pub fn validate(&self, record: &Value) -> Vec<String> {
        let validator = match jsonschema::validator_for(&self.0) {
            Ok(validator) => validator,
            Err(err) => return vec![format!("invalid schema: {err}")],
        };
        validator
            .iter_errors(record)
            .map(|err| err.to_string())
            .collect()
    }
}
