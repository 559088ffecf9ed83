//! Structured-completion capability.
//!
//! The compiler never talks to a language model directly. It hands a prompt
//! and a function-calling style schema to a [`StructuredCompletion`] and
//! expects back the parsed arguments object.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Function definition describing the object a completion must return.
///
/// Maps onto the `functions` array of a function-calling request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSchema {
    /// Function name (e.g. `describe_triggers`)
    pub name: String,
    /// What the function does
    pub description: String,
    /// JSON Schema for the function's parameters
    pub parameters: Value,
}

/// A capability that, given a prompt and a response schema, returns a parsed
/// object matching the schema or fails.
#[async_trait]
pub trait StructuredCompletion: Send + Sync {
    /// Runs one completion.
    async fn complete_structured(&self, prompt: &str, schema: &ResponseSchema) -> Result<Value>;
}
