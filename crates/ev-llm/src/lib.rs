//! # ev-llm
//!
//! Schema-constrained language-model inference for Evidentia.
//!
//! - [`ChatModel`] is the capability seam: anything that can answer a prompt
//!   with raw text. [`OpenAiChat`] speaks the OpenAI-compatible
//!   `/chat/completions` protocol with `json_schema` response formats.
//! - [`StructuredInference`] wraps a model and returns typed records that
//!   have been validated against the record's JSON Schema.
//! - [`RetryPolicy`] retries [`Transient`] failures with capped exponential
//!   backoff, honoring `Retry-After`.

pub mod chat;
pub mod error;
pub mod http;
pub mod retry;
pub mod structured;

pub use chat::{ChatModel, ChatRequest, OpenAiChat};
pub use error::InferenceError;
pub use retry::{RetryPolicy, Transient};
pub use structured::{GenerationRequest, StructuredInference, parse_structured};
