use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Result, SkillError};

/// Metadata about a skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMetadata {
    /// Name the skill is dispatched by, unique within an agent
    pub name: String,
    /// Description of what this skill does
    pub description: String,
    /// Version
    pub version: String,
    /// Tags for categorization
    pub tags: Vec<String>,
}

impl SkillMetadata {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            version: "1.0.0".to_string(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<&str>) -> Self {
        self.tags = tags.into_iter().map(String::from).collect();
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }
}

/// A single-purpose capability.
///
/// Implementations must be stateless: `execute` takes `&self` and must not
/// change anything observable by a later call. Collaborators such as model
/// clients are held behind shared references and passed in at construction.
#[async_trait]
pub trait Skill: Send + Sync {
    /// Get skill metadata
    fn metadata(&self) -> &SkillMetadata;

    /// Name used for dispatch
    fn name(&self) -> &str {
        &self.metadata().name
    }

    /// Execute the skill with given input
    async fn execute(&self, input: SkillInput) -> Result<SkillOutput>;
}

/// Input for skill execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillInput {
    /// Text payload
    pub text: String,
    /// Per-call configuration options
    pub options: HashMap<String, serde_json::Value>,
    /// Rendered shared context, if the caller has one
    pub context: Option<String>,
}

impl SkillInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_option(mut self, key: &str, value: serde_json::Value) -> Self {
        self.options.insert(key.to_string(), value);
        self
    }

    pub fn with_options(mut self, options: HashMap<String, serde_json::Value>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Trimmed payload, or `InvalidInput` when there is nothing to work on.
    pub fn require_text(&self) -> Result<&str> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(SkillError::InvalidInput("empty text payload".to_string()));
        }
        Ok(text)
    }

    /// Typed option lookup. A missing key is `None`; a present key with the
    /// wrong shape is an error rather than being silently ignored.
    pub fn option<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.options.get(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| SkillError::InvalidInput(format!("option '{}': {}", key, e))),
        }
    }
}

/// Output from skill execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillOutput {
    /// Text result
    pub text: String,
    /// Structured result
    pub result: HashMap<String, serde_json::Value>,
    /// Execution metadata
    pub metadata: ExecutionMetadata,
}

impl SkillOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_result(mut self, key: &str, value: serde_json::Value) -> Self {
        self.result.insert(key.to_string(), value);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.metadata.model = Some(model.into());
        self
    }

    pub fn with_tokens(mut self, tokens: u32) -> Self {
        self.metadata.tokens_used = Some(tokens);
        self
    }
}

/// Metadata reported by the skill itself
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ExecutionMetadata {
    /// Tokens used (if LLM)
    pub tokens_used: Option<u32>,
    /// Model used
    pub model: Option<String>,
}
