//! Transport layer for device communication
//!
//! This module provides the datagram endpoint shared by discovery and the
//! request correlator:
//! - UDP transport bound to the device port with broadcast enabled
//! - Mock transport with a simulated device for testing
//!
//! # Example
//!
//! ```ignore
//! use venus_udp::transport::{create_transport, DatagramTransport};
//! use venus_udp::config::TransportConfig;
//!
//! let config = TransportConfig::Mock(Default::default());
//! let transport = create_transport(&config).await?;
//! transport.send_to(b"{}", "192.168.0.225:30000".parse()?).await?;
//! ```

mod adapter;
pub mod error;
pub mod mock;
pub mod simulated;
pub mod udp;

pub use adapter::{Datagram, DatagramTransport};
pub use error::TransportError;
pub use mock::MockTransport;
pub use simulated::SimulatedDevice;
pub use udp::UdpTransport;

use std::sync::Arc;

use crate::config::TransportConfig;

/// Create a transport based on configuration
pub async fn create_transport(
    config: &TransportConfig,
) -> Result<Arc<dyn DatagramTransport>, TransportError> {
    match config {
        TransportConfig::Udp(cfg) => {
            let transport = UdpTransport::bind(cfg)?;
            Ok(Arc::new(transport))
        }
        TransportConfig::Mock(cfg) => {
            let transport = MockTransport::new(cfg);
            Ok(Arc::new(transport))
        }
    }
}
