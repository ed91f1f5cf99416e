use std::fmt;
use std::time::Duration;

use crate::error::{InferenceError, Result};

pub const ENDPOINT_VAR: &str = "AZURE_OPENAI_ENDPOINT";
pub const API_KEY_VAR: &str = "AZURE_OPENAI_API_KEY";
pub const DEPLOYMENT_VAR: &str = "AZURE_OPENAI_DEPLOYMENT";
pub const API_VERSION_VAR: &str = "AZURE_OPENAI_API_VERSION";
pub const TIMEOUT_VAR: &str = "ORCHESTRA_REQUEST_TIMEOUT_SECS";

pub const DEFAULT_DEPLOYMENT: &str = "gpt-4.1";
pub const DEFAULT_API_VERSION: &str = "2025-01-01-preview";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for an Azure OpenAI chat deployment
#[derive(Clone, PartialEq)]
pub struct ModelConfig {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
    pub request_timeout: Duration,
}

impl ModelConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            deployment: DEFAULT_DEPLOYMENT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.deployment = deployment.into();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| InferenceError::Config(format!("{} is not set", key)))
        };

        let endpoint = require(ENDPOINT_VAR)?;
        let api_key = require(API_KEY_VAR)?;

        let request_timeout = match get(TIMEOUT_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| InferenceError::Config(format!("{} must be whole seconds, got '{}'", TIMEOUT_VAR, raw)))?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            deployment: get(DEPLOYMENT_VAR).unwrap_or_else(|| DEFAULT_DEPLOYMENT.to_string()),
            api_version: get(API_VERSION_VAR).unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            request_timeout,
        })
    }
}

// Keeps the key out of logs.
impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
