use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ModelConfig;
use crate::error::{InferenceError, Result};
use crate::model::{ChatMessage, Completion, CompletionClient, GenerationParams};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "no_stop_sequences")]
    stop: &'a [String],
}

fn no_stop_sequences(stop: &&[String]) -> bool {
    stop.is_empty()
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

/// Chat-completion client for an Azure OpenAI deployment
pub struct AzureOpenAiClient {
    http: reqwest::Client,
    config: ModelConfig,
    url: String,
}

impl AzureOpenAiClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let url = format!(
            "{}/openai/deployments/{}/chat/completions",
            config.endpoint.trim_end_matches('/'),
            config.deployment
        );
        Ok(Self { http, config, url })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CompletionClient for AzureOpenAiClient {
    fn name(&self) -> &str {
        &self.config.deployment
    }

    async fn chat(&self, messages: &[ChatMessage], params: &GenerationParams) -> Result<Completion> {
        if messages.is_empty() {
            return Err(InferenceError::InvalidInput("no messages to send".to_string()));
        }

        let body = ChatRequest {
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            stop: &params.stop,
        };

        debug!(
            deployment = %self.config.deployment,
            messages = messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .http
            .post(&self.url)
            .query(&[("api-version", self.config.api_version.as_str())])
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(deployment = %self.config.deployment, status = status.as_u16(), "Chat completion rejected");
            return Err(InferenceError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| InferenceError::InvalidResponse("response carried no message content".to_string()))?;

        Ok(Completion {
            text,
            model: parsed.model.unwrap_or_else(|| self.config.deployment.clone()),
            tokens_used: parsed.usage.map(|u| u.total_tokens),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AzureOpenAiClient {
        AzureOpenAiClient::new(ModelConfig::new(server.uri(), "test-key")).unwrap()
    }

    #[tokio::test]
    async fn sends_deployment_request_and_reads_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4.1/chat/completions"))
            .and(query_param("api-version", "2025-01-01-preview"))
            .and(header("api-key", "test-key"))
            .and(body_partial_json(json!({
                "messages": [{"role": "user", "content": "What's your return policy?"}],
                "max_tokens": 800
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gpt-4.1-2025-04-14",
                "choices": [{"message": {"role": "assistant", "content": "30 days."}}],
                "usage": {"total_tokens": 42}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let completion = client_for(&server)
            .complete("What's your return policy?", &GenerationParams::default())
            .await
            .unwrap();

        assert_eq!(completion.text, "30 days.");
        assert_eq!(completion.model, "gpt-4.1-2025-04-14");
        assert_eq!(completion.tokens_used, Some(42));
    }

    #[tokio::test]
    async fn non_success_status_is_reported_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete("hi", &GenerationParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, InferenceError::Http { status: 429, ref body } if body == "rate limited"));
    }

    #[tokio::test]
    async fn missing_content_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": null}}]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete("hi", &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn empty_conversation_never_hits_the_network() {
        let client = AzureOpenAiClient::new(ModelConfig::new("http://127.0.0.1:9", "k")).unwrap();
        let err = client.chat(&[], &GenerationParams::default()).await.unwrap_err();
        assert!(matches!(err, InferenceError::InvalidInput(_)));
    }

    #[test]
    fn url_joins_endpoint_and_deployment() {
        let client = AzureOpenAiClient::new(
            ModelConfig::new("https://res.openai.azure.com/", "k").with_deployment("gpt-4o"),
        )
        .unwrap();
        assert_eq!(
            client.url(),
            "https://res.openai.azure.com/openai/deployments/gpt-4o/chat/completions"
        );
    }
}
