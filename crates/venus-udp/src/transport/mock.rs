//! Mock transport for testing

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{Datagram, DatagramTransport, SimulatedDevice, TransportError};
use crate::config::{MockConfig, DEVICE_PORT};

/// Produces the datagrams delivered in reply to one send
pub type Responder = Arc<dyn Fn(&[u8], SocketAddr) -> Vec<(SocketAddr, Vec<u8>)> + Send + Sync>;

/// A datagram recorded by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentDatagram {
    pub dest: SocketAddr,
    pub data: Vec<u8>,
}

/// In-memory transport
///
/// Every send is recorded and handed to the responder; whatever the responder
/// returns is queued for the receive side, after the configured latency.
pub struct MockTransport {
    config: MockConfig,
    local: SocketAddr,
    open: AtomicBool,
    responder: Responder,
    device: Option<Arc<SimulatedDevice>>,
    sent: Mutex<Vec<SentDatagram>>,
    inbox_tx: mpsc::UnboundedSender<Datagram>,
    inbox_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Datagram>>,
}

impl MockTransport {
    /// Mock backed by a [`SimulatedDevice`]
    pub fn new(config: &MockConfig) -> Self {
        let device = Arc::new(SimulatedDevice::new(config, DEVICE_PORT));
        let responder_device = device.clone();
        let responder: Responder = Arc::new(move |data: &[u8], dest: SocketAddr| {
            responder_device.respond(data, dest).into_iter().collect()
        });
        let mut mock = Self::with_responder(config, responder);
        mock.device = Some(device);
        mock
    }

    /// Mock whose replies come from `responder`
    pub fn with_responder(config: &MockConfig, responder: Responder) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            config: config.clone(),
            local: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEVICE_PORT),
            open: AtomicBool::new(true),
            responder,
            device: None,
            sent: Mutex::new(Vec::new()),
            inbox_tx,
            inbox_rx: tokio::sync::Mutex::new(inbox_rx),
        }
    }

    /// Mock that never replies
    pub fn silent() -> Self {
        Self::with_responder(&MockConfig::default(), Arc::new(|_: &[u8], _: SocketAddr| {
            Vec::<(SocketAddr, Vec<u8>)>::new()
        }))
    }

    /// The simulated device, when built with [`MockTransport::new`]
    pub fn device(&self) -> Option<&Arc<SimulatedDevice>> {
        self.device.as_ref()
    }

    /// Deliver a datagram to the receive side (simulates unsolicited traffic)
    pub fn inject_incoming(&self, data: Vec<u8>, source: SocketAddr) {
        let _ = self.inbox_tx.send(Datagram::new(data, source));
    }

    /// Every datagram sent so far
    pub fn sent(&self) -> Vec<SentDatagram> {
        self.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Make further sends and receives fail
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn deliver(&self, datagrams: Vec<Datagram>) {
        if datagrams.is_empty() {
            return;
        }
        if self.config.latency_ms == 0 {
            for dg in datagrams {
                let _ = self.inbox_tx.send(dg);
            }
            return;
        }

        let tx = self.inbox_tx.clone();
        let latency = Duration::from_millis(self.config.latency_ms);
        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            for dg in datagrams {
                let _ = tx.send(dg);
            }
        });
    }
}

#[async_trait]
impl DatagramTransport for MockTransport {
    async fn send_to(&self, data: &[u8], dest: SocketAddr) -> Result<(), TransportError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }

        self.sent.lock().push(SentDatagram {
            dest,
            data: data.to_vec(),
        });
        tracing::debug!(%dest, len = data.len(), "Mock transport: sent datagram");

        let mut inbound = Vec::new();
        if self.config.echo_broadcasts && is_broadcast(dest.ip()) {
            inbound.push(Datagram::new(data.to_vec(), self.local));
        }
        for (source, reply) in (self.responder)(data, dest) {
            inbound.push(Datagram::new(reply, source));
        }
        self.deliver(inbound);
        Ok(())
    }

    async fn recv_timeout(&self, timeout: Duration) -> Result<Option<Datagram>, TransportError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }

        let mut inbox = self.inbox_rx.lock().await;
        match tokio::time::timeout(timeout, inbox.recv()).await {
            Ok(Some(dg)) => Ok(Some(dg)),
            Ok(None) => Err(TransportError::Closed),
            Err(_) => Ok(None),
        }
    }

    fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.local)
    }
}

fn is_broadcast(ip: IpAddr) -> bool {
    matches!(ip, IpAddr::V4(v4) if v4.is_broadcast())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{codec, methods};

    #[tokio::test]
    async fn test_simulated_device_replies_to_probe() {
        let mock = MockTransport::new(&MockConfig::default());
        let probe = codec::encode_request(&methods::discovery_probe(None)).unwrap();
        mock.send_to(&probe, "255.255.255.255:30000".parse().unwrap())
            .await
            .unwrap();

        let dg = mock
            .recv_timeout(Duration::from_millis(100))
            .await
            .unwrap()
            .expect("reply");
        assert_eq!(dg.source, "192.168.0.225:30000".parse::<SocketAddr>().unwrap());
        assert_eq!(mock.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_echo_broadcasts() {
        let config = MockConfig {
            echo_broadcasts: true,
            ..Default::default()
        };
        let mock = MockTransport::new(&config);
        let probe = codec::encode_request(&methods::discovery_probe(None)).unwrap();
        mock.send_to(&probe, "255.255.255.255:30000".parse().unwrap())
            .await
            .unwrap();

        let first = mock
            .recv_timeout(Duration::from_millis(100))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.data, probe);
        assert!(mock
            .recv_timeout(Duration::from_millis(100))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_latency_delays_delivery() {
        let config = MockConfig {
            latency_ms: 50,
            ..Default::default()
        };
        let mock = MockTransport::new(&config);
        let probe = codec::encode_request(&methods::discovery_probe(None)).unwrap();
        mock.send_to(&probe, "255.255.255.255:30000".parse().unwrap())
            .await
            .unwrap();

        assert!(mock
            .recv_timeout(Duration::from_millis(5))
            .await
            .unwrap()
            .is_none());
        assert!(mock
            .recv_timeout(Duration::from_millis(500))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_silent_and_closed() {
        let mock = MockTransport::silent();
        mock.send_to(b"{}", "192.168.0.225:30000".parse().unwrap())
            .await
            .unwrap();
        assert!(mock
            .recv_timeout(Duration::from_millis(10))
            .await
            .unwrap()
            .is_none());

        mock.close();
        assert!(matches!(
            mock.send_to(b"{}", "192.168.0.225:30000".parse().unwrap()).await,
            Err(TransportError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_inject_incoming() {
        let mock = MockTransport::silent();
        mock.inject_incoming(b"hello".to_vec(), "10.0.0.9:30000".parse().unwrap());
        let dg = mock
            .recv_timeout(Duration::from_millis(10))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(dg.data, b"hello");
    }
}
