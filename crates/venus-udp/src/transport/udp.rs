//! UDP transport bound to the device port

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tokio::net::UdpSocket;
use tracing::{debug, info};

use super::{Datagram, DatagramTransport, TransportError};
use crate::config::UdpConfig;

/// Largest datagram accepted from a device
const MAX_DATAGRAM: usize = 8192;

/// UDP socket shared for broadcast probes and unicast requests
///
/// The device sends discovery replies to its own well-known port no matter
/// where the probe came from, so this socket binds that port instead of an
/// ephemeral one. Address and port reuse let it coexist with other listeners.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Create the socket with reuse and broadcast enabled, then bind it
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind(config: &UdpConfig) -> Result<Self, TransportError> {
        let addr = SocketAddr::new(config.bind_addr, config.port);
        let bind_err = |e: io::Error| TransportError::Bind {
            addr: addr.to_string(),
            reason: e.to_string(),
        };

        let socket =
            Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP)).map_err(bind_err)?;
        socket.set_reuse_address(true).map_err(bind_err)?;
        #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
        socket.set_reuse_port(true).map_err(bind_err)?;
        socket
            .set_broadcast(true)
            .map_err(|e| TransportError::Broadcast(e.to_string()))?;
        socket.set_nonblocking(true).map_err(bind_err)?;
        socket.bind(&SockAddr::from(addr)).map_err(bind_err)?;

        let std_socket: std::net::UdpSocket = socket.into();
        let socket = UdpSocket::from_std(std_socket).map_err(bind_err)?;

        info!(%addr, "UDP transport bound");
        Ok(Self { socket })
    }
}

#[async_trait]
impl DatagramTransport for UdpTransport {
    async fn send_to(&self, data: &[u8], dest: SocketAddr) -> Result<(), TransportError> {
        self.socket
            .send_to(data, dest)
            .await
            .map_err(|e| TransportError::SendFailed {
                dest: dest.to_string(),
                reason: e.to_string(),
            })?;
        debug!(%dest, len = data.len(), "Sent datagram");
        Ok(())
    }

    async fn recv_timeout(&self, timeout: Duration) -> Result<Option<Datagram>, TransportError> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        match tokio::time::timeout(timeout, self.socket.recv_from(&mut buf)).await {
            Ok(Ok((len, source))) => {
                buf.truncate(len);
                Ok(Some(Datagram::new(buf, source)))
            }
            Ok(Err(e)) => Err(TransportError::ReceiveFailed(e.to_string())),
            Err(_) => Ok(None),
        }
    }

    fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.socket
            .local_addr()
            .map_err(|e| TransportError::ReceiveFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn loopback_any_port() -> UdpConfig {
        UdpConfig {
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
        }
    }

    #[tokio::test]
    async fn test_bind_and_loopback() {
        let a = UdpTransport::bind(&loopback_any_port()).unwrap();
        let b = UdpTransport::bind(&loopback_any_port()).unwrap();
        let b_addr = b.local_addr().unwrap();

        a.send_to(b"ping", b_addr).await.unwrap();
        let dg = b
            .recv_timeout(Duration::from_secs(2))
            .await
            .unwrap()
            .expect("datagram");
        assert_eq!(dg.data, b"ping");
        assert_eq!(dg.source, a.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_recv_timeout_returns_none() {
        let t = UdpTransport::bind(&loopback_any_port()).unwrap();
        let got = t.recv_timeout(Duration::from_millis(20)).await.unwrap();
        assert!(got.is_none());
    }
}
