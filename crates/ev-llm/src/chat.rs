//! Chat-completion capability and its OpenAI-compatible client.

use std::future::Future;
use std::time::Duration;

use ev_config::LlmConfig;
use serde::{Deserialize, Serialize};

use crate::error::InferenceError;
use crate::http::check_response;

/// One schema-constrained completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Optional system instruction.
    pub system: Option<String>,
    /// The user prompt.
    pub prompt: String,
    /// Name of the requested output schema (`[A-Za-z0-9_-]`).
    pub schema_name: String,
    /// JSON Schema the answer must satisfy.
    pub schema: serde_json::Value,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Capability: answer a prompt with raw model text.
///
/// Implementations return the model's content verbatim; parsing and schema
/// validation happen in [`crate::StructuredInference`].
pub trait ChatModel: Send + Sync {
    /// Model identifier, for logs.
    fn model_name(&self) -> &str;

    /// Run one completion.
    fn complete(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<String, InferenceError>> + Send;
}

/// Client for `POST {api_base}/chat/completions` with `json_schema` output.
#[derive(Clone)]
pub struct OpenAiChat {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<Message<'a>>,
    response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    schema: &'a serde_json::Value,
    strict: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

impl OpenAiChat {
    /// Build a client from the `llm` configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::Config`] if the HTTP client cannot be built.
    pub fn from_config(config: &LlmConfig) -> Result<Self, InferenceError> {
        let http = reqwest::Client::builder()
            .user_agent("evidentia/0.1")
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| InferenceError::Config(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// Full URL requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ChatModel for OpenAiChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, InferenceError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(Message {
                role: "system",
                content: system,
            });
        }
        messages.push(Message {
            role: "user",
            content: &request.prompt,
        });

        let body = CompletionBody {
            model: &self.model,
            temperature: request.temperature,
            messages,
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: &request.schema_name,
                    schema: &request.schema,
                    strict: false,
                },
            },
        };

        tracing::debug!(model = %self.model, schema = %request.schema_name, "chat completion");
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let resp = check_response(resp).await?;
        let parsed: CompletionResponse = resp.json().await?;
        extract_content(parsed)
    }
}

fn extract_content(response: CompletionResponse) -> Result<String, InferenceError> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| InferenceError::EmptyResponse("no choices returned".into()))?;
    if let Some(refusal) = message.refusal.filter(|r| !r.trim().is_empty()) {
        return Err(InferenceError::EmptyResponse(format!("model refused: {refusal}")));
    }
    message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| InferenceError::EmptyResponse("message has no content".into()))
}
