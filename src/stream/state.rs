//! Stream Connection State
//!
//! Lifecycle states of a stream connection plus the observable status
//! snapshot the worker keeps up to date.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a stream connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Constructed, worker not yet connecting
    #[default]
    Disconnected,
    /// Transport connect in flight
    Connecting,
    /// Session established, heartbeat running
    Connected,
    /// Drop observed, single reconnect timer pending
    ReconnectWait,
    /// Terminal. Entered on caller close or retry policy exhaustion
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::ReconnectWait => "reconnect_wait",
            ConnectionState::Closed => "closed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Observable snapshot of one stream connection
#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamStatus {
    pub state: ConnectionState,
    /// Connect attempts so far, successful or not
    pub connect_attempts: u64,
    /// Sessions that reached Connected
    pub sessions: u64,
    pub frames_received: u64,
    pub events_dispatched: u64,
    /// Frames dropped as liveness noise (non-event traffic)
    pub frames_ignored: u64,
    pub probes_sent: u64,
    pub last_connected: Option<DateTime<Utc>>,
    pub last_frame: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}
