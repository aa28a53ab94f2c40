//! Stream Module - Resilient Progress Feed Client
//!
//! This module handles:
//! - Connection lifecycle (connect, heartbeat, reconnect, close)
//! - Frame decoding and in-order event dispatch
//! - Reconnect scheduling policies
//! - The pluggable transport seam

pub mod client;
pub mod retry;
pub mod state;
pub mod transport;


pub use client::{StreamClient, StreamConfig, StreamHandler, TransportError};
pub use retry::RetryPolicy;
pub use state::{ConnectionState, StreamStatus};
pub use transport::{StreamConnection, StreamTransport, TcpTransport};
