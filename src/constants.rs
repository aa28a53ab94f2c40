//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! To point the console at a different service, only edit this file
//! or set the matching GUARDSCOPE_* environment variable.

/// Default evaluation service base URL (HTTP API)
///
/// This is the fallback URL when no environment variable is set.
/// For development: http://localhost:8000
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Default progress stream address (host:port, newline-delimited frames)
pub const DEFAULT_STREAM_ADDR: &str = "127.0.0.1:9800";

/// Default reconnect delay after a transport drop (milliseconds)
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 2000;

/// Default heartbeat interval (seconds)
pub const DEFAULT_HEARTBEAT_INTERVAL: u64 = 30;

/// Liveness probe token sent over the stream
///
/// Plain text, deliberately not JSON. The service may echo it back
/// (or reply "pong"); such frames carry no payload and are dropped.
pub const HEARTBEAT_PROBE: &str = "ping";

/// Default attacker model for optimization jobs
pub const DEFAULT_MODEL_NAME: &str = "gpt-3.5-turbo";

/// Default optimization iteration cap
pub const DEFAULT_MAX_ITERATIONS: u32 = 20;

/// Default candidates tested per iteration
pub const DEFAULT_CANDIDATES_PER_ITERATION: u32 = 8;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "GuardScope";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get the evaluation service URL from environment or use default
pub fn get_server_url() -> String {
    std::env::var("GUARDSCOPE_SERVER_URL")
        .unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string())
}

/// Get the stream address from environment or use default
pub fn get_stream_addr() -> String {
    std::env::var("GUARDSCOPE_STREAM_ADDR")
        .unwrap_or_else(|_| DEFAULT_STREAM_ADDR.to_string())
}

/// Get the reconnect delay (ms) from environment or use default
pub fn get_reconnect_delay_ms() -> u64 {
    std::env::var("GUARDSCOPE_RECONNECT_DELAY_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_RECONNECT_DELAY_MS)
}

/// Get the heartbeat interval (seconds) from environment or use default
pub fn get_heartbeat_interval() -> u64 {
    std::env::var("GUARDSCOPE_HEARTBEAT_INTERVAL")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL)
}
