//! Stream Transport
//!
//! Seam between the connection state machine and the wire. Production use
//! is a TCP connection carrying newline-delimited UTF-8 frames; tests plug
//! in scripted in-memory connections.

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// One established duplex connection
#[async_trait]
pub trait StreamConnection: Send {
    /// Receive the next frame. `Ok(None)` means the remote side closed
    /// cleanly. Must be cancel safe: a dropped call loses no buffered
    /// bytes.
    async fn recv(&mut self) -> io::Result<Option<String>>;

    /// Send one frame.
    async fn send(&mut self, frame: &str) -> io::Result<()>;
}

/// Connection factory, called once per connect attempt
#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn connect(&self) -> io::Result<Box<dyn StreamConnection>>;
}

/// TCP transport: one frame per '\n'-terminated line
pub struct TcpTransport {
    addr: String,
}

impl TcpTransport {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl StreamTransport for TcpTransport {
    async fn connect(&self) -> io::Result<Box<dyn StreamConnection>> {
        let stream = TcpStream::connect(&self.addr).await?;
        log::debug!("Transport connected to {}", self.addr);
        Ok(Box::new(TcpConnection {
            stream,
            buf: Vec::new(),
        }))
    }
}

/// Established TCP connection with its partial-frame buffer
struct TcpConnection {
    stream: TcpStream,
    buf: Vec<u8>,
}

impl TcpConnection {
    /// Pop one complete line off the front of the buffer, if present
    fn take_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

#[async_trait]
impl StreamConnection for TcpConnection {
    async fn recv(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(line) = self.take_line() {
                return Ok(Some(line));
            }
            // read_buf appends into self.buf, so a canceled recv leaves
            // partial frames buffered for the next call.
            let n = self.stream.read_buf(&mut self.buf).await?;
            if n == 0 {
                // Clean EOF. An unterminated tail is not a frame.
                return Ok(None);
            }
        }
    }

    async fn send(&mut self, frame: &str) -> io::Result<()> {
        self.stream.write_all(frame.as_bytes()).await?;
        self.stream.write_all(b"\n").await?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn pair() -> (Box<dyn StreamConnection>, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let transport = TcpTransport::new(addr.to_string());
        let (conn, accepted) = tokio::join!(transport.connect(), listener.accept());
        (conn.unwrap(), accepted.unwrap().0)
    }

    #[tokio::test]
    async fn test_recv_splits_frames_on_newlines() {
        let (mut conn, mut server) = pair().await;

        server.write_all(b"first\nsecond\r\nthi").await.unwrap();
        assert_eq!(conn.recv().await.unwrap(), Some("first".to_string()));
        assert_eq!(conn.recv().await.unwrap(), Some("second".to_string()));

        server.write_all(b"rd\n").await.unwrap();
        assert_eq!(conn.recv().await.unwrap(), Some("third".to_string()));
    }

    #[tokio::test]
    async fn test_recv_reports_clean_eof_as_none() {
        let (mut conn, mut server) = pair().await;

        server.write_all(b"only\npartial tail").await.unwrap();
        drop(server);

        assert_eq!(conn.recv().await.unwrap(), Some("only".to_string()));
        assert_eq!(conn.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_send_appends_newline() {
        let (mut conn, mut server) = pair().await;

        conn.send("ping").await.unwrap();
        drop(conn);

        let mut received = Vec::new();
        server.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"ping\n");
    }

    #[tokio::test]
    async fn test_connect_failure_is_an_error() {
        // Bind then drop to get a port with no listener
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = TcpTransport::new(addr.to_string());
        assert!(transport.connect().await.is_err());
    }
}
