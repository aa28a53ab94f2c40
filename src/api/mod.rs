//! API Module - Evaluation Service HTTP Client
//!
//! This module handles:
//! - Job submission (fire-and-forget optimizer start)
//! - One-shot prompt and response detection
//! - Service health checks

pub mod client;
pub mod types;

pub use client::{ApiClient, ApiConfig, ApiError};
pub use types::{
    DetectRequest, DetectResponse, HealthStatus, Objective, OptimizationRequest, StartAck,
};
