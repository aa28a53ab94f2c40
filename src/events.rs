//! Stream Event Types
//!
//! Wire-format DTOs for the job progress stream. Every inbound frame is
//! either a JSON envelope tagged by `type` (`progress`, `result`, `error`)
//! or a plain-text liveness reply, which decodes to nothing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One decoded message from the progress stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Progress { data: ProgressUpdate },
    Result { data: OptimizationResult },
    Error { message: String },
}

/// Per-candidate progress update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub iteration: u32,
    pub candidate_index: u32,
    pub candidate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_safety: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_safety: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<serde_json::Value>,
    /// Combined fitness score in [0, 1]
    pub score: f32,
    pub prompt_safe_score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_safe_score: Option<f32>,
    /// Reason the candidate was not evaluated (filtered before scoring)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
    /// Run token correlating this update to a submitted job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
}

impl ProgressUpdate {
    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }
}

/// Terminal result of an optimization run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jailbreak_prompt: Option<String>,
    pub iterations: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_safety: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_safety: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Best candidate seen before a failed run gave up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_attempt: Option<ProgressUpdate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
}

impl StreamEvent {
    /// Wire discriminator of this event
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Progress { .. } => "progress",
            StreamEvent::Result { .. } => "result",
            StreamEvent::Error { .. } => "error",
        }
    }

    /// Run token carried by the payload, if the feed echoes one
    pub fn run_id(&self) -> Option<Uuid> {
        match self {
            StreamEvent::Progress { data } => data.run_id,
            StreamEvent::Result { data } => data.run_id,
            StreamEvent::Error { .. } => None,
        }
    }
}

/// Decode one inbound frame into a stream event.
///
/// Frames that do not parse as a tagged JSON envelope are liveness
/// replies (e.g. a "pong" echo) and decode to `None`. That is expected
/// traffic, not an error, so it is only logged at trace level.
pub fn decode_frame(frame: &str) -> Option<StreamEvent> {
    match serde_json::from_str(frame.trim()) {
        Ok(event) => Some(event),
        Err(e) => {
            log::trace!("Ignoring non-event frame ({}): {:?}", e, frame);
            None
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
