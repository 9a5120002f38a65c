//! The duplex byte-channel abstraction a Face sends/receives TLV elements
//! over: TCP, a Unix domain socket, or a WebSocket.
//!
//! The adapter does not interpret bytes beyond framing them into chunks for
//! the element reader; TLV parsing happens one layer up in `Face`. Each
//! connected transport is split into a writer (owned by the Face actor, so
//! `send`/`close` never race with the read loop) and a reader (owned by a
//! dedicated task that feeds inbound chunks back to the actor).

use crate::error::{FaceError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;

/// Default NFD Unix-socket path tried first.
pub const DEFAULT_UNIX_SOCKET: &str = "/var/run/nfd.sock";
/// Fallback Unix-socket path.
pub const FALLBACK_UNIX_SOCKET: &str = "/tmp/.ndnd.sock";
/// Default TCP port for an NDN forwarder.
pub const DEFAULT_TCP_PORT: u16 = 6363;
/// Default WebSocket port for an NDN forwarder.
pub const DEFAULT_WEBSOCKET_PORT: u16 = 9696;

/// How to reach a forwarder. Selected at construction; no further variant
/// switching happens once a Face has picked one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionInfo {
    Tcp(SocketAddr),
    Unix(PathBuf),
    WebSocket { host: String, port: u16 },
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(addr) => write!(f, "tcp://{}", addr),
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
            Self::WebSocket { host, port } => write!(f, "ws://{}:{}", host, port),
        }
    }
}

/// Picks a platform-appropriate default: the well-known Unix socket if it
/// exists, the fallback Unix socket if that exists, else TCP loopback.
pub fn default_connection_info() -> ConnectionInfo {
    if PathBuf::from(DEFAULT_UNIX_SOCKET).exists() {
        return ConnectionInfo::Unix(PathBuf::from(DEFAULT_UNIX_SOCKET));
    }
    if PathBuf::from(FALLBACK_UNIX_SOCKET).exists() {
        return ConnectionInfo::Unix(PathBuf::from(FALLBACK_UNIX_SOCKET));
    }
    ConnectionInfo::Tcp(SocketAddr::from(([127, 0, 0, 1], DEFAULT_TCP_PORT)))
}

/// Resolves whether `info` points at this host. May need to resolve a
/// hostname, hence async.
pub async fn is_local(info: &ConnectionInfo) -> bool {
    match info {
        ConnectionInfo::Unix(_) => true,
        ConnectionInfo::Tcp(addr) => addr.ip().is_loopback(),
        ConnectionInfo::WebSocket { host, .. } => {
            if host == "localhost" {
                return true;
            }
            match tokio::net::lookup_host((host.as_str(), 0))
                .await
                .ok()
                .and_then(|mut it| it.next())
            {
                Some(addr) => addr.ip().is_loopback(),
                None => false,
            }
        }
    }
}

/// The write half of a connected transport.
#[async_trait]
pub trait TransportWriter: Send {
    async fn send(&mut self, bytes: Bytes) -> Result<()>;
    async fn close(&mut self) -> Result<()>;
}

/// The read half of a connected transport.
#[async_trait]
pub trait TransportReader: Send {
    /// Reads the next chunk of inbound bytes. `Ok(None)` signals a clean
    /// close of the underlying channel.
    async fn recv(&mut self) -> Result<Option<Bytes>>;
}

/// Connects to `info`, returning the split writer/reader pair.
pub async fn connect(
    info: &ConnectionInfo,
) -> Result<(Box<dyn TransportWriter>, Box<dyn TransportReader>)> {
    match info {
        ConnectionInfo::Tcp(addr) => {
            let stream = TcpStream::connect(addr)
                .await
                .map_err(|e| FaceError::TransportError(e.to_string()))?;
            let (read, write) = stream.into_split();
            Ok((
                Box::new(TcpWriter(write)),
                Box::new(TcpReader(read)),
            ))
        }
        ConnectionInfo::Unix(path) => connect_unix(path).await,
        ConnectionInfo::WebSocket { host, port } => {
            let url = format!("ws://{}:{}", host, port);
            let (stream, _response) = tokio_tungstenite::connect_async(url)
                .await
                .map_err(|e| FaceError::TransportError(e.to_string()))?;
            let (write, read) = stream.split();
            Ok((
                Box::new(WebSocketWriter(write)),
                Box::new(WebSocketReader(read)),
            ))
        }
    }
}

#[cfg(unix)]
async fn connect_unix(
    path: &PathBuf,
) -> Result<(Box<dyn TransportWriter>, Box<dyn TransportReader>)> {
    let stream = tokio::net::UnixStream::connect(path)
        .await
        .map_err(|e| FaceError::TransportError(e.to_string()))?;
    let (read, write) = stream.into_split();
    Ok((Box::new(UnixWriter(write)), Box::new(UnixReader(read))))
}

#[cfg(not(unix))]
async fn connect_unix(
    _path: &PathBuf,
) -> Result<(Box<dyn TransportWriter>, Box<dyn TransportReader>)> {
    Err(FaceError::TransportError(
        "unix-domain-socket transport is unavailable on this platform".into(),
    ))
}

struct TcpWriter(tokio::net::tcp::OwnedWriteHalf);
struct TcpReader(tokio::net::tcp::OwnedReadHalf);

#[async_trait]
impl TransportWriter for TcpWriter {
    async fn send(&mut self, bytes: Bytes) -> Result<()> {
        self.0
            .write_all(&bytes)
            .await
            .map_err(|e| FaceError::TransportError(e.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        let _ = self.0.shutdown().await;
        Ok(())
    }
}

#[async_trait]
impl TransportReader for TcpReader {
    async fn recv(&mut self) -> Result<Option<Bytes>> {
        let mut buf = [0u8; 8192];
        let n = self
            .0
            .read(&mut buf)
            .await
            .map_err(|e| FaceError::TransportError(e.to_string()))?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(Bytes::copy_from_slice(&buf[..n])))
    }
}

#[cfg(unix)]
struct UnixWriter(tokio::net::unix::OwnedWriteHalf);
#[cfg(unix)]
struct UnixReader(tokio::net::unix::OwnedReadHalf);

#[cfg(unix)]
#[async_trait]
impl TransportWriter for UnixWriter {
    async fn send(&mut self, bytes: Bytes) -> Result<()> {
        self.0
            .write_all(&bytes)
            .await
            .map_err(|e| FaceError::TransportError(e.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        let _ = self.0.shutdown().await;
        Ok(())
    }
}

#[cfg(unix)]
#[async_trait]
impl TransportReader for UnixReader {
    async fn recv(&mut self) -> Result<Option<Bytes>> {
        let mut buf = [0u8; 8192];
        let n = self
            .0
            .read(&mut buf)
            .await
            .map_err(|e| FaceError::TransportError(e.to_string()))?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(Bytes::copy_from_slice(&buf[..n])))
    }
}

type WsStream = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<TcpStream>>;

struct WebSocketWriter(futures::stream::SplitSink<WsStream, Message>);
struct WebSocketReader(futures::stream::SplitStream<WsStream>);

#[async_trait]
impl TransportWriter for WebSocketWriter {
    async fn send(&mut self, bytes: Bytes) -> Result<()> {
        self.0
            .send(Message::Binary(bytes.to_vec()))
            .await
            .map_err(|e| FaceError::TransportError(e.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        let _ = self.0.close().await;
        Ok(())
    }
}

#[async_trait]
impl TransportReader for WebSocketReader {
    async fn recv(&mut self) -> Result<Option<Bytes>> {
        loop {
            match self.0.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(Some(Bytes::from(data))),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // ignore text/ping/pong frames
                Some(Err(e)) => return Err(FaceError::TransportError(e.to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_connection_info_falls_back_to_tcp_loopback() {
        // In the test sandbox neither well-known socket exists.
        match default_connection_info() {
            ConnectionInfo::Tcp(addr) => assert_eq!(addr.port(), DEFAULT_TCP_PORT),
            other => panic!("expected TCP fallback, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unix_and_loopback_tcp_are_local() {
        assert!(is_local(&ConnectionInfo::Unix(PathBuf::from("/tmp/x"))).await);
        assert!(is_local(&ConnectionInfo::Tcp(SocketAddr::from(([127, 0, 0, 1], 6363)))).await);
        assert!(!is_local(&ConnectionInfo::Tcp(SocketAddr::from(([8, 8, 8, 8], 6363)))).await);
    }
}
