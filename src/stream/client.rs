//! Stream Client
//!
//! Resilient duplex client for the job progress feed. A single worker
//! task owns the transport and drives the lifecycle machine:
//!
//!   Connecting -> Connected -> ReconnectWait -> Connecting -> ...
//!
//! Decoded events reach the handler in arrival order. Every drop not
//! caused by `close()` is retried per the configured policy; `close()` is
//! idempotent and, once it returns, no callback runs again.

use super::retry::RetryPolicy;
use super::state::{ConnectionState, StreamStatus};
use super::transport::{StreamConnection, StreamTransport, TcpTransport};
use crate::constants;
use crate::events::{decode_frame, StreamEvent};
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, sleep_until, Instant, MissedTickBehavior};

/// Transport-level failures surfaced through the error callback
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),
    #[error("receive failed: {0}")]
    Recv(#[source] std::io::Error),
    #[error("send failed: {0}")]
    Send(#[source] std::io::Error),
}

/// Receives decoded events and transport notices from the worker.
///
/// Calls are strictly serialized on the worker task. They stop for good
/// once `close()` has returned.
pub trait StreamHandler: Send + 'static {
    /// One decoded event, in arrival order
    fn on_event(&mut self, event: StreamEvent);

    /// A transport-level failure. Informational only: the client
    /// reconnects on its own. Never fires for undecodable frames, those
    /// are liveness replies.
    fn on_transport_error(&mut self, _error: &TransportError) {}
}

/// Stream client configuration
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Liveness probe interval while connected
    pub heartbeat_interval: Duration,
    /// Reconnect scheduling after a drop
    pub retry: RetryPolicy,
    /// Drop a session with no inbound traffic for this long. Off by
    /// default: reconnects are then driven only by the transport's own
    /// close or error signal.
    pub idle_timeout: Option<Duration>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(constants::get_heartbeat_interval()),
            retry: RetryPolicy::default(),
            idle_timeout: None,
        }
    }
}

/// State shared between the caller-facing handle and the worker
struct Shared {
    status: RwLock<StreamStatus>,
    closed: AtomicBool,
    shutdown: Notify,
}

impl Shared {
    fn set_state(&self, state: ConnectionState) {
        self.status.write().state = state;
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Handle to one logical stream connection
pub struct StreamClient {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl StreamClient {
    /// Open a stream to the configured endpoint and start connecting.
    /// Returns immediately; connection work happens on the worker task.
    pub fn open<H: StreamHandler>(handler: H) -> Self {
        Self::open_with(
            Arc::new(TcpTransport::new(constants::get_stream_addr())),
            StreamConfig::default(),
            handler,
        )
    }

    /// Open a stream through an explicit transport and configuration
    pub fn open_with<H: StreamHandler>(
        transport: Arc<dyn StreamTransport>,
        config: StreamConfig,
        handler: H,
    ) -> Self {
        let shared = Arc::new(Shared {
            status: RwLock::new(StreamStatus::default()),
            closed: AtomicBool::new(false),
            shutdown: Notify::new(),
        });
        let worker = tokio::spawn(run_worker(shared.clone(), transport, config, handler));
        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.shared.status.read().state
    }

    /// Snapshot of the connection counters
    pub fn status(&self) -> StreamStatus {
        self.shared.status.read().clone()
    }

    /// Shut the stream down.
    ///
    /// Safe to call any number of times, in any state. Pending reconnect
    /// timers and in-flight connect attempts are abandoned. When this
    /// returns the worker has exited, so no handler call can follow.
    pub async fn close(&mut self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        self.shared.shutdown.notify_one();
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                if e.is_panic() {
                    log::error!("Stream worker panicked: {}", e);
                }
            }
        }
        self.shared.set_state(ConnectionState::Closed);
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        // Not a substitute for close(); stops a leaked worker outright.
        if let Some(worker) = &self.worker {
            worker.abort();
        }
    }
}

// ============================================================================
// WORKER
// ============================================================================

enum SessionEnd {
    Shutdown,
    RemoteClosed,
    Error,
    IdleTimeout,
}

async fn run_worker<H: StreamHandler>(
    shared: Arc<Shared>,
    transport: Arc<dyn StreamTransport>,
    config: StreamConfig,
    mut handler: H,
) {
    // Failed attempts since the last successful connect
    let mut attempt: u32 = 0;

    loop {
        if shared.is_closed() {
            break;
        }

        shared.status.write().connect_attempts += 1;
        shared.set_state(ConnectionState::Connecting);

        let connected = tokio::select! {
            biased;
            _ = shared.shutdown.notified() => break,
            result = transport.connect() => result,
        };

        let end = match connected {
            Ok(conn) => {
                attempt = 0;
                let session = {
                    let mut status = shared.status.write();
                    status.state = ConnectionState::Connected;
                    status.sessions += 1;
                    status.last_connected = Some(Utc::now());
                    status.last_error = None;
                    status.sessions
                };
                log::info!("Stream connected (session {})", session);
                run_session(&shared, conn, &config, &mut handler).await
            }
            Err(e) => {
                let error = TransportError::Connect(e);
                log::warn!("Stream {}", error);
                shared.status.write().last_error = Some(error.to_string());
                handler.on_transport_error(&error);
                SessionEnd::Error
            }
        };

        if matches!(end, SessionEnd::Shutdown) || shared.is_closed() {
            break;
        }

        attempt += 1;
        let Some(delay) = config.retry.delay_for(attempt) else {
            log::warn!(
                "Reconnect policy exhausted after {} attempts, closing stream",
                attempt
            );
            break;
        };

        shared.set_state(ConnectionState::ReconnectWait);
        log::debug!("Reconnecting in {:?} (attempt {})", delay, attempt);
        tokio::select! {
            biased;
            _ = shared.shutdown.notified() => break,
            _ = sleep(delay) => {}
        }
    }

    shared.set_state(ConnectionState::Closed);
    log::debug!("Stream worker stopped");
}

async fn run_session<H: StreamHandler>(
    shared: &Arc<Shared>,
    mut conn: Box<dyn StreamConnection>,
    config: &StreamConfig,
    handler: &mut H,
) -> SessionEnd {
    let mut heartbeat = interval_at(
        Instant::now() + config.heartbeat_interval,
        config.heartbeat_interval,
    );
    // A stalled dispatch loop must not burst queued probes afterwards
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut idle_deadline = config.idle_timeout.map(|t| Instant::now() + t);

    loop {
        let idle_wait = async {
            match idle_deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = shared.shutdown.notified() => {
                return SessionEnd::Shutdown;
            }
            _ = idle_wait => {
                log::warn!(
                    "No inbound traffic for {:?}, dropping connection",
                    config.idle_timeout.unwrap_or_default()
                );
                shared.status.write().last_error = Some("idle timeout".to_string());
                return SessionEnd::IdleTimeout;
            }
            _ = heartbeat.tick() => {
                if let Err(e) = conn.send(constants::HEARTBEAT_PROBE).await {
                    let error = TransportError::Send(e);
                    log::warn!("Stream {}", error);
                    shared.status.write().last_error = Some(error.to_string());
                    handler.on_transport_error(&error);
                    return SessionEnd::Error;
                }
                shared.status.write().probes_sent += 1;
                log::trace!("Liveness probe sent");
            }
            frame = conn.recv() => match frame {
                Ok(Some(frame)) => {
                    let event = decode_frame(&frame);
                    {
                        let mut status = shared.status.write();
                        status.frames_received += 1;
                        status.last_frame = Some(Utc::now());
                        match &event {
                            Some(_) => status.events_dispatched += 1,
                            None => status.frames_ignored += 1,
                        }
                    }
                    idle_deadline = config.idle_timeout.map(|t| Instant::now() + t);
                    if let Some(event) = event {
                        log::trace!("Dispatching {} event", event.kind());
                        handler.on_event(event);
                    }
                }
                Ok(None) => {
                    log::info!("Stream closed by remote");
                    return SessionEnd::RemoteClosed;
                }
                Err(e) => {
                    let error = TransportError::Recv(e);
                    log::warn!("Stream {}", error);
                    shared.status.write().last_error = Some(error.to_string());
                    handler.on_transport_error(&error);
                    return SessionEnd::Error;
                }
            },
        }
    }
}
