//! Schema-constrained generation.
//!
//! [`StructuredInference`] asks a [`ChatModel`] for JSON matching the
//! `schemars` schema of a target type, validates the answer with
//! `jsonschema`, and only then deserializes it. Callers never see partially
//! valid records.

use std::time::Duration;

use ev_config::{EvConfig, LlmConfig};
use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use tracing::Instrument;

use crate::chat::{ChatModel, ChatRequest};
use crate::error::InferenceError;
use crate::retry::RetryPolicy;

/// Prompt text for one structured call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system: Option<String>,
    pub prompt: String,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
        }
    }

    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Typed JSON generation on top of a chat model.
pub struct StructuredInference<M> {
    model: M,
    retry: RetryPolicy,
    temperature: f32,
    request_timeout: Duration,
}

impl<M: ChatModel> StructuredInference<M> {
    #[must_use]
    pub fn new(model: M) -> Self {
        let llm = LlmConfig::default();
        Self {
            model,
            retry: RetryPolicy::default(),
            temperature: llm.temperature,
            request_timeout: Duration::from_secs(llm.request_timeout_secs),
        }
    }

    /// Apply temperature, timeout, and retry settings from configuration.
    #[must_use]
    pub fn configured(model: M, config: &EvConfig) -> Self {
        Self {
            model,
            retry: RetryPolicy::from(&config.evaluation),
            temperature: config.llm.temperature,
            request_timeout: Duration::from_secs(config.llm.request_timeout_secs),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn model(&self) -> &M {
        &self.model
    }

    /// Generate one `T`.
    ///
    /// Transient failures are retried per the configured [`RetryPolicy`];
    /// malformed or non-conforming output is not.
    ///
    /// # Errors
    ///
    /// - [`InferenceError::InvalidJson`] if the answer is not JSON.
    /// - [`InferenceError::SchemaViolation`] if it does not match `T`'s schema.
    /// - Transport and API errors once retries are exhausted.
    pub async fn generate<T>(&self, request: &GenerationRequest) -> Result<T, InferenceError>
    where
        T: DeserializeOwned + JsonSchema + Send,
    {
        let schema = serde_json::to_value(schema_for!(T))
            .map_err(|e| InferenceError::Schema(e.to_string()))?;
        let chat = ChatRequest {
            system: request.system.clone(),
            prompt: request.prompt.clone(),
            schema_name: sanitize_schema_name(&T::schema_name()),
            schema: wire_schema(&schema),
            temperature: self.temperature,
        };

        let span = tracing::debug_span!(
            "generate",
            model = self.model.model_name(),
            schema = %chat.schema_name
        );
        let raw = self
            .retry
            .run(&chat.schema_name, || self.complete_once(&chat))
            .instrument(span)
            .await?;
        tracing::debug!(schema = %chat.schema_name, bytes = raw.len(), "structured response received");
        parse_structured(&raw, &schema)
    }

    async fn complete_once(&self, chat: &ChatRequest) -> Result<String, InferenceError> {
        tokio::time::timeout(self.request_timeout, self.model.complete(chat))
            .await
            .map_err(|_| InferenceError::Timeout(self.request_timeout))?
    }
}

/// Parse and validate raw model output against `schema`, then deserialize.
///
/// # Errors
///
/// Returns [`InferenceError::InvalidJson`] or [`InferenceError::SchemaViolation`].
pub fn parse_structured<T: DeserializeOwned>(
    raw: &str,
    schema: &serde_json::Value,
) -> Result<T, InferenceError> {
    let body = strip_code_fence(raw);
    let instance: serde_json::Value =
        serde_json::from_str(body).map_err(|e| InferenceError::InvalidJson(e.to_string()))?;

    let validator =
        jsonschema::validator_for(schema).map_err(|e| InferenceError::Schema(format!("{e}")))?;
    let errors: Vec<String> = validator
        .iter_errors(&instance)
        .map(|e| format!("{e}"))
        .collect();
    if !errors.is_empty() {
        return Err(InferenceError::SchemaViolation { errors });
    }

    serde_json::from_value(instance).map_err(|e| InferenceError::SchemaViolation {
        errors: vec![e.to_string()],
    })
}

/// Remove a surrounding Markdown code fence, if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Schema as sent on the wire; the `$schema` keyword is dropped.
fn wire_schema(schema: &serde_json::Value) -> serde_json::Value {
    let mut wire = schema.clone();
    if let Some(map) = wire.as_object_mut() {
        map.remove("$schema");
    }
    wire
}

fn sanitize_schema_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "output".to_string()
    } else {
        cleaned
    }
}
