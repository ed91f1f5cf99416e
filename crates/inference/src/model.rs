use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{InferenceError, Result};

/// Generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Temperature (0.0 = deterministic, 1.0 = creative)
    pub temperature: f32,
    /// Top-p sampling
    pub top_p: f32,
    /// Stop sequences
    pub stop: Vec<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 800,
            temperature: 0.7,
            top_p: 0.95,
            stop: Vec::new(),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: ChatRole::System,
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: ChatRole::User,
            content: content.to_string(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.to_string(),
        }
    }
}

/// A finished completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub tokens_used: Option<u32>,
}

/// Abstract chat-completion service
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Client or deployment name, used for logging and output metadata
    fn name(&self) -> &str;

    /// Chat completion over a message list
    async fn chat(&self, messages: &[ChatMessage], params: &GenerationParams) -> Result<Completion>;

    /// Single-prompt completion
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<Completion> {
        self.chat(&[ChatMessage::user(prompt)], params).await
    }
}

type Responder = Box<dyn Fn(&[ChatMessage]) -> String + Send + Sync>;

/// Local stand-in for a completion service.
///
/// Answers with queued responses first, then the responder if one is set,
/// then echoes the last user message.
pub struct MockClient {
    name: String,
    responses: Mutex<VecDeque<String>>,
    responder: Option<Responder>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockClient {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            responses: Mutex::new(VecDeque::new()),
            responder: None,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue a canned response
    pub fn with_response(self, response: &str) -> Self {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response.to_string());
        }
        self
    }

    /// Compute replies from the messages once the queue is empty
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&[ChatMessage]) -> String + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Make every call fail with a service error
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Number of calls seen so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for MockClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(&self, messages: &[ChatMessage], _params: &GenerationParams) -> Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.failure {
            return Err(InferenceError::Http {
                status: 503,
                body: message.clone(),
            });
        }

        let queued = self.responses.lock().ok().and_then(|mut q| q.pop_front());
        let text = match (queued, &self.responder) {
            (Some(text), _) => text,
            (None, Some(responder)) => responder(messages),
            (None, None) => {
                let last = messages
                    .iter()
                    .rev()
                    .find(|m| m.role == ChatRole::User)
                    .ok_or_else(|| InferenceError::InvalidInput("no user message".to_string()))?;
                format!("[{}] {}", self.name, last.content)
            }
        };

        let tokens = text.split_whitespace().count() as u32;
        Ok(Completion {
            text,
            model: self.name.clone(),
            tokens_used: Some(tokens),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_prefers_queued_responses() {
        let client = MockClient::new("mock")
            .with_response("first")
            .with_response("second");
        let params = GenerationParams::default();

        assert_eq!(client.complete("a", &params).await.unwrap().text, "first");
        assert_eq!(client.complete("b", &params).await.unwrap().text, "second");
        assert_eq!(client.complete("c", &params).await.unwrap().text, "[mock] c");
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn mock_echoes_last_user_turn() {
        let client = MockClient::new("mock");
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("hello"),
            ChatMessage::assistant("hi"),
        ];
        let completion = client.chat(&messages, &GenerationParams::default()).await.unwrap();
        assert_eq!(completion.text, "[mock] hello");
    }

    #[tokio::test]
    async fn responder_answers_after_the_queue_drains() {
        let client = MockClient::new("mock")
            .with_response("queued")
            .with_responder(|messages| format!("{} messages", messages.len()));
        let params = GenerationParams::default();

        assert_eq!(client.complete("a", &params).await.unwrap().text, "queued");
        assert_eq!(client.complete("b", &params).await.unwrap().text, "1 messages");
        assert_eq!(client.complete("c", &params).await.unwrap().text, "1 messages");
    }

    #[tokio::test]
    async fn failing_mock_reports_service_error() {
        let client = MockClient::new("mock").failing("overloaded");
        let err = client.complete("x", &GenerationParams::default()).await.unwrap_err();
        assert!(matches!(err, InferenceError::Http { status: 503, .. }));
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_value(ChatMessage::system("s")).unwrap();
        assert_eq!(json["role"], "system");
    }
}
