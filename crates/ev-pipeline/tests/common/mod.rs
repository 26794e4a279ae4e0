//! Scripted chat models and fixtures shared by the pipeline tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ev_config::{EmbeddingProvider, EvConfig};
use ev_embeddings::HashingEmbedder;
use ev_llm::{ChatModel, ChatRequest, InferenceError};
use ev_pipeline::Pipeline;

/// One scripted answer.
pub struct Reply {
    pub delay: Duration,
    pub result: Result<String, InferenceError>,
}

impl Reply {
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(value.to_string()),
        }
    }

    pub fn error(error: InferenceError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(error),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Answers every request through `respond`, recording requests and the
/// peak number of concurrent calls.
pub struct ScriptedModel<F> {
    respond: F,
    pub requests: Mutex<Vec<ChatRequest>>,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl<F> ScriptedModel<F>
where
    F: Fn(&ChatRequest) -> Reply + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }
}

impl<F> ChatModel for ScriptedModel<F>
where
    F: Fn(&ChatRequest) -> Reply + Send + Sync,
{
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, InferenceError> {
        self.requests.lock().unwrap().push(request.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let reply = (self.respond)(request);
        tokio::time::sleep(reply.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply.result
    }
}

/// The `Requirement:` line of an analysis prompt.
pub fn requirement_of(request: &ChatRequest) -> &str {
    request
        .prompt
        .lines()
        .find_map(|line| line.strip_prefix("Requirement: "))
        .unwrap_or_default()
}

pub fn is_analysis(request: &ChatRequest) -> bool {
    request.schema_name == "ComplianceAnalysis"
}

pub fn analysis(is_compliant: bool, reason: &str, confidence: f64) -> Reply {
    Reply::json(serde_json::json!({
        "is_compliant": is_compliant,
        "reason": reason,
        "confidence": confidence,
    }))
}

/// Offline configuration with fast retries.
pub fn test_config() -> EvConfig {
    let mut config = EvConfig::default();
    config.embedding.provider = EmbeddingProvider::Hashing;
    config.embedding.dimensions = 384;
    config.evaluation.base_delay_ms = 1;
    config.evaluation.max_delay_ms = 2;
    config
}

pub fn pipeline<F>(config: EvConfig, respond: F) -> Pipeline<ScriptedModel<F>, HashingEmbedder>
where
    F: Fn(&ChatRequest) -> Reply + Send + Sync + 'static,
{
    let embedder = HashingEmbedder::new(config.embedding.dimensions);
    Pipeline::new(config, ScriptedModel::new(respond), embedder)
}

pub fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

pub const BREACH_EVIDENCE: &str = "Data breach procedures are documented and tested quarterly.";

pub const OTHER_EVIDENCE: &str = "Visitor parking permits are issued at the front desk. \
     The cafeteria is open from eight until three.";
