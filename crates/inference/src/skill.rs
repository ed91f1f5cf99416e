use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use orchestra_skill::{Result as SkillResult, Skill, SkillError, SkillInput, SkillMetadata, SkillOutput};

use crate::error::InferenceError;
use crate::model::{ChatMessage, Completion, CompletionClient, GenerationParams};

/// Default parameters with per-call overrides from `max_tokens` / `temperature` options
fn resolve_params(defaults: &GenerationParams, input: &SkillInput) -> SkillResult<GenerationParams> {
    let mut params = defaults.clone();
    if let Some(max_tokens) = input.option::<u32>("max_tokens")? {
        params.max_tokens = max_tokens;
    }
    if let Some(temperature) = input.option::<f32>("temperature")? {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(SkillError::InvalidInput(format!(
                "temperature must be within 0.0..=2.0, got {}",
                temperature
            )));
        }
        params.temperature = temperature;
    }
    Ok(params)
}

fn service_error(e: InferenceError) -> SkillError {
    match e {
        InferenceError::InvalidInput(msg) => SkillError::InvalidInput(msg),
        other => SkillError::ExternalService(other.to_string()),
    }
}

fn into_output(completion: Completion) -> SkillOutput {
    let output = SkillOutput::text(completion.text).with_model(completion.model);
    match completion.tokens_used {
        Some(tokens) => output.with_tokens(tokens),
        None => output,
    }
}

/// Text completion skill
pub struct CompletionSkill {
    metadata: SkillMetadata,
    client: Arc<dyn CompletionClient>,
    default_params: GenerationParams,
}

impl CompletionSkill {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            metadata: SkillMetadata::new("complete", "Generate a text completion for the payload")
                .with_tags(vec!["llm", "text", "generation"]),
            client,
            default_params: GenerationParams::default(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.default_params = params;
        self
    }
}

#[async_trait]
impl Skill for CompletionSkill {
    fn metadata(&self) -> &SkillMetadata {
        &self.metadata
    }

    async fn execute(&self, input: SkillInput) -> SkillResult<SkillOutput> {
        let prompt = input.require_text()?;
        let params = resolve_params(&self.default_params, &input)?;

        let completion = self
            .client
            .complete(prompt, &params)
            .await
            .map_err(service_error)?;

        Ok(into_output(completion))
    }
}

/// Chat skill with an optional persona
///
/// Shared context handed in through [`SkillInput::context`] is sent as a
/// second system message, after the persona.
pub struct ChatSkill {
    metadata: SkillMetadata,
    client: Arc<dyn CompletionClient>,
    system_prompt: Option<String>,
    default_params: GenerationParams,
}

impl ChatSkill {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            metadata: SkillMetadata::new("chat", "Answer the payload as a chat turn")
                .with_tags(vec!["llm", "chat", "conversation"]),
            client,
            system_prompt: None,
            default_params: GenerationParams::default(),
        }
    }

    /// Register under a different name, e.g. `synthesize`
    pub fn named(mut self, name: &str, description: &str) -> Self {
        self.metadata.name = name.to_string();
        self.metadata.description = description.to_string();
        self
    }

    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = Some(prompt.to_string());
        self
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.default_params = params;
        self
    }

    fn messages(&self, text: &str, context: Option<&str>) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(3);
        if let Some(system) = &self.system_prompt {
            messages.push(ChatMessage::system(system));
        }
        if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
            messages.push(ChatMessage::system(context));
        }
        messages.push(ChatMessage::user(text));
        messages
    }
}

#[async_trait]
impl Skill for ChatSkill {
    fn metadata(&self) -> &SkillMetadata {
        &self.metadata
    }

    async fn execute(&self, input: SkillInput) -> SkillResult<SkillOutput> {
        let text = input.require_text()?;
        let params = resolve_params(&self.default_params, &input)?;
        let messages = self.messages(text, input.context.as_deref());

        debug!(skill = %self.metadata.name, turns = messages.len(), "Chat request");

        let completion = self
            .client
            .chat(&messages, &params)
            .await
            .map_err(service_error)?;

        Ok(into_output(completion))
    }
}

const ANALYZE_ERROR_PROMPT: &str = "You are a senior engineer triaging a failure. \
Explain the most likely cause of the error below and suggest a concrete fix. \
Keep the answer short.";

/// Explains an error message or stack trace
pub struct AnalyzeErrorSkill {
    metadata: SkillMetadata,
    client: Arc<dyn CompletionClient>,
}

impl AnalyzeErrorSkill {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            metadata: SkillMetadata::new("analyze_error", "Explain an error message and suggest a fix")
                .with_tags(vec!["llm", "diagnostics"]),
            client,
        }
    }
}

#[async_trait]
impl Skill for AnalyzeErrorSkill {
    fn metadata(&self) -> &SkillMetadata {
        &self.metadata
    }

    async fn execute(&self, input: SkillInput) -> SkillResult<SkillOutput> {
        let error_text = input.require_text()?;

        let params = GenerationParams {
            temperature: 0.2,
            ..Default::default()
        };
        let params = resolve_params(&params, &input)?;
        let messages = [
            ChatMessage::system(ANALYZE_ERROR_PROMPT),
            ChatMessage::user(error_text),
        ];

        let completion = self
            .client
            .chat(&messages, &params)
            .await
            .map_err(service_error)?;

        Ok(into_output(completion))
    }
}
