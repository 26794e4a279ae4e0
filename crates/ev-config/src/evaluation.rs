//! Per-item evaluation settings: concurrency, status mapping, retry budget.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const fn default_concurrency() -> usize {
    4
}

const fn default_ambiguity_threshold() -> f64 {
    0.5
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_base_delay_ms() -> u64 {
    500
}

const fn default_max_delay_ms() -> u64 {
    4000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvaluationConfig {
    /// Maximum checklist items evaluated at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Model confidence below this maps to `ambiguous`. `0.0` disables.
    #[serde(default = "default_ambiguity_threshold")]
    pub ambiguity_threshold: f64,

    /// Attempts per inference call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, doubled on each further retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Cap on the retry delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            ambiguity_threshold: default_ambiguity_threshold(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl EvaluationConfig {
    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}
