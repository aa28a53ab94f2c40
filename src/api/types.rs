//! API Request/Response Types
//!
//! Wire DTOs for the evaluation service's HTTP endpoints.

use crate::risk::{classify, RiskVector, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// What counts as a successful candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    /// Harmful response while the prompt itself passes detection
    #[default]
    Goal1,
    /// Both prompt and response pass detection
    Goal2,
    /// Prompt detection only, no downstream model
    Goal3,
}

impl Objective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Objective::Goal1 => "goal1",
            Objective::Goal2 => "goal2",
            Objective::Goal3 => "goal3",
        }
    }

    /// Goal1 and goal2 score the downstream model's answers, so they
    /// need downstream credentials
    pub fn needs_downstream(&self) -> bool {
        matches!(self, Objective::Goal1 | Objective::Goal2)
    }
}

/// Job submission payload for the optimizer
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationRequest {
    pub malicious_intent: String,
    pub objective: Objective,
    pub api_key: String,
    pub model_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downstream_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downstream_model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downstream_base_url: Option<String>,
    pub max_iterations: u32,
    pub candidates_per_iteration: u32,
    /// Run token echoed back on every streamed event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
}

impl OptimizationRequest {
    /// Request with the service defaults filled in
    pub fn new(malicious_intent: impl Into<String>, api_key: impl Into<String>) -> Self {
        use crate::constants;

        Self {
            malicious_intent: malicious_intent.into(),
            objective: Objective::default(),
            api_key: api_key.into(),
            model_name: constants::DEFAULT_MODEL_NAME.to_string(),
            base_url: None,
            downstream_api_key: None,
            downstream_model_name: None,
            downstream_base_url: None,
            max_iterations: constants::DEFAULT_MAX_ITERATIONS,
            candidates_per_iteration: constants::DEFAULT_CANDIDATES_PER_ITERATION,
            run_id: None,
        }
    }
}

/// Detection request: `content` for prompt checks, `prompt` plus
/// `response` for response checks and reasoning analysis
#[derive(Debug, Clone, Default, Serialize)]
pub struct DetectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

/// Detection reply: raw model output plus its score maps
#[derive(Debug, Clone, Deserialize)]
pub struct DetectResponse {
    pub response: String,
    pub token_score: HashMap<String, f32>,
    pub risk_score: RiskVector,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl DetectResponse {
    /// Severity verdict over the risk vector. `None` when the service
    /// returned no scores.
    pub fn verdict(&self) -> Option<Verdict> {
        classify(&self.risk_score)
    }
}

/// Acknowledgement for a job submission; results arrive via the stream
#[derive(Debug, Clone, Deserialize)]
pub struct StartAck {
    pub status: String,
    pub message: String,
}

/// Service health report
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub detector_loaded: bool,
    pub active_ws_connections: u32,
}

// ============================================================================
// TESTS
// ============================================================================
