//! Evaluation Service API Client
//!
//! HTTP client for job submission and one-shot detection. Job results do
//! not come back through here; they arrive on the progress stream.

use super::types::{DetectRequest, DetectResponse, HealthStatus, OptimizationRequest, StartAck};
use crate::constants;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// API client errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server error ({status}): {body}")]
    Server { status: u16, body: String },
    #[error("parse error: {0}")]
    Parse(String),
}

/// Evaluation service configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: constants::get_server_url(),
            timeout_seconds: 30,
        }
    }
}

/// Evaluation service API client
pub struct ApiClient {
    config: ApiConfig,
    http_client: reqwest::Client,
}

impl ApiClient {
    /// Create new API client
    pub fn new(config: ApiConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Check service health
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = format!("{}/api/health", self.config.base_url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::decode(response).await
    }

    /// Submit an optimization job. Fire and forget: the acknowledgement
    /// arrives immediately, progress and results only via the stream.
    pub async fn start_optimization(
        &self,
        request: &OptimizationRequest,
    ) -> Result<StartAck, ApiError> {
        let url = format!("{}/api/optimizer/start", self.config.base_url);

        log::info!(
            "Submitting optimization job ({} x {} candidates) to {}",
            request.max_iterations,
            request.candidates_per_iteration,
            self.config.base_url
        );

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let ack: StartAck = Self::decode(response).await?;
        log::info!("Job accepted: {}", ack.status);
        Ok(ack)
    }

    /// Score a single prompt
    pub async fn detect_prompt(&self, content: &str) -> Result<DetectResponse, ApiError> {
        let request = DetectRequest {
            content: Some(content.to_string()),
            ..Default::default()
        };
        self.post_detect("/api/detect/prompt", &request).await
    }

    /// Score a model response in the context of its prompt
    pub async fn detect_response(
        &self,
        prompt: &str,
        response: &str,
    ) -> Result<DetectResponse, ApiError> {
        let request = DetectRequest {
            prompt: Some(prompt.to_string()),
            response: Some(response.to_string()),
            ..Default::default()
        };
        self.post_detect("/api/detect/response", &request).await
    }

    /// Full reasoning analysis for a prompt/response pair. Same shape as
    /// detection, with the explanation populated.
    pub async fn analyze_reasoning(
        &self,
        prompt: &str,
        response: &str,
    ) -> Result<DetectResponse, ApiError> {
        let request = DetectRequest {
            prompt: Some(prompt.to_string()),
            response: Some(response.to_string()),
            ..Default::default()
        };
        self.post_detect("/api/detect/reasoning", &request).await
    }

    async fn post_detect(
        &self,
        path: &str,
        request: &DetectRequest,
    ) -> Result<DetectResponse, ApiError> {
        let url = format!("{}{}", self.config.base_url, path);

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| ApiError::Parse(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            log::warn!("API request failed ({}): {}", status, body);
            Err(ApiError::Server { status, body })
        }
    }
}
