//! Frame transports
//!
//! The Hue bridge accepts frames only over a DTLS session on UDP port 2100.
//! DTLS is not implemented here: [`UdpTransport`] writes plain datagrams to a
//! relay that terminates DTLS towards the bridge (see
//! [`HueConfig::relay_target`](crate::hue::models::HueConfig::relay_target)).

use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::UdpSocket;

use super::protocol::decode_frame;

/// Port the bridge listens on for entertainment streaming
pub const STREAM_PORT: u16 = 2100;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("short write: sent {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    #[error("transport closed")]
    Closed,
}

/// Something frames can be written to.
#[async_trait::async_trait]
pub trait Transport: Send {
    /// Writes one complete frame. Errors are fatal to the stream.
    async fn write(&mut self, frame: &[u8]) -> Result<(), TransportError>;
}

/// Sends each frame as one UDP datagram to a fixed peer. Binding and
/// connecting a UDP socket never waits on the peer.
pub struct UdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpTransport {
    pub async fn connect(peer: SocketAddr) -> Result<Self, TransportError> {
        let bind: SocketAddr = if peer.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(peer).await?;

        tracing::info!("Sending frames as UDP datagrams to {}", peer);

        Ok(Self { socket, peer })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

#[async_trait::async_trait]
impl Transport for UdpTransport {
    async fn write(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        let written = self.socket.send(frame).await?;
        if written != frame.len() {
            return Err(TransportError::ShortWrite {
                written,
                expected: frame.len(),
            });
        }
        Ok(())
    }
}

/// Logs decoded frames instead of sending them. Used for dry runs.
#[derive(Default)]
pub struct LogTransport {
    frames: u64,
    last: Vec<u8>,
}

impl LogTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_written(&self) -> u64 {
        self.frames
    }
}

#[async_trait::async_trait]
impl Transport for LogTransport {
    async fn write(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.frames += 1;
        // Only log frames whose content changed
        if frame != self.last.as_slice() {
            match decode_frame(frame) {
                Ok(decoded) => {
                    for entry in &decoded.entries {
                        tracing::info!(
                            "frame {}: channel {} -> {:04X} {:04X} {:04X}",
                            self.frames,
                            entry.channel_id,
                            entry.components[0],
                            entry.components[1],
                            entry.components[2]
                        );
                    }
                    if decoded.entries.is_empty() {
                        tracing::info!("frame {}: no channel entries", self.frames);
                    }
                }
                Err(e) => tracing::warn!("frame {}: {}", self.frames, e),
            }
            self.last.clear();
            self.last.extend_from_slice(frame);
        }
        Ok(())
    }
}
