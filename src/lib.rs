//! GuardScope - Streaming Console Core
//!
//! Client-side core for prompt-safety evaluation jobs:
//! - `stream`: resilient progress feed client (reconnect, heartbeat, dispatch)
//! - `risk`: severity tiering over per-category risk probabilities
//! - `tracker`: per-run aggregation of progress updates
//! - `api`: HTTP client for the evaluation service
//! - `events`: wire frame schema and decoding

pub mod api;
pub mod constants;
pub mod events;
pub mod risk;
pub mod stream;
pub mod tracker;

pub use api::{ApiClient, ApiConfig, ApiError, DetectResponse, HealthStatus, Objective,
    OptimizationRequest, StartAck};
pub use events::{decode_frame, OptimizationResult, ProgressUpdate, StreamEvent};
pub use risk::{classify, RiskVector, Severity, Verdict};
pub use stream::{
    ConnectionState, RetryPolicy, StreamClient, StreamConfig, StreamHandler, StreamStatus,
    TcpTransport, TransportError,
};
pub use tracker::{RunOutcome, RunStats, RunTracker};
