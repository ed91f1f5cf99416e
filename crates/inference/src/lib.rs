//! Chat-completion backends for orchestra skills.
//!
//! A [`CompletionClient`] is the only thing a skill needs to talk to a model.
//! [`AzureOpenAiClient`] speaks the Azure OpenAI REST API; [`MockClient`]
//! answers locally for tests and offline runs.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use orchestra_inference::{AzureOpenAiClient, ChatSkill, ModelConfig};
//!
//! let client = Arc::new(AzureOpenAiClient::new(ModelConfig::from_env()?)?);
//! let chat = ChatSkill::new(client).with_system_prompt("You are a helpful shopping assistant.");
//! ```

pub mod azure;
pub mod config;
pub mod error;
pub mod model;
pub mod skill;

pub use azure::AzureOpenAiClient;
pub use config::ModelConfig;
pub use error::{InferenceError, Result};
pub use model::{ChatMessage, ChatRole, Completion, CompletionClient, GenerationParams, MockClient};
pub use skill::{AnalyzeErrorSkill, ChatSkill, CompletionSkill};
