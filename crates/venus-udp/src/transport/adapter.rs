//! Datagram transport trait and types

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;

use super::TransportError;

/// A datagram received from the network
#[derive(Debug, Clone)]
pub struct Datagram {
    /// Raw payload
    pub data: Vec<u8>,
    /// Sender address
    pub source: SocketAddr,
}

impl Datagram {
    pub fn new(data: Vec<u8>, source: SocketAddr) -> Self {
        Self { data, source }
    }
}

/// Connectionless transport shared by discovery and unicast calls
///
/// Implementations own a single endpoint. Sends may come from any task;
/// receives are driven by one reader at a time.
#[async_trait]
pub trait DatagramTransport: Send + Sync {
    /// Send one datagram to `dest` (unicast or broadcast)
    async fn send_to(&self, data: &[u8], dest: SocketAddr) -> Result<(), TransportError>;

    /// Wait up to `timeout` for the next datagram
    ///
    /// Returns `Ok(None)` when the timeout elapses with nothing received.
    async fn recv_timeout(&self, timeout: Duration) -> Result<Option<Datagram>, TransportError>;

    /// Local address the transport is bound to
    fn local_addr(&self) -> Result<SocketAddr, TransportError>;
}
