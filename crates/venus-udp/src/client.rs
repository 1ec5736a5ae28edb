//! Client entry point

use std::sync::Arc;
use std::time::Duration;

use venus_core::DeviceDescriptor;

use crate::config::ClientConfig;
use crate::device::{DeviceTarget, VenusDevice};
use crate::discovery;
use crate::error::ClientError;
use crate::rpc::RpcEndpoint;
use crate::transport::{create_transport, DatagramTransport};

/// Owns the shared transport and hands out per-device handles
///
/// Discovery and any number of device calls may run concurrently over the
/// one socket.
pub struct VenusClient {
    endpoint: Arc<RpcEndpoint>,
    config: ClientConfig,
}

impl VenusClient {
    /// Open the configured transport and start receiving
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = create_transport(&config.transport).await?;
        Ok(Self::with_transport(transport, config))
    }

    /// Use an existing transport
    pub fn with_transport(transport: Arc<dyn DatagramTransport>, config: ClientConfig) -> Self {
        let endpoint = Arc::new(RpcEndpoint::start(transport, config.rpc.clone()));
        Self { endpoint, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &Arc<RpcEndpoint> {
        &self.endpoint
    }

    /// Find every device on the local broadcast domain
    ///
    /// `window` overrides the configured listening window.
    pub async fn discover(
        &self,
        window: Option<Duration>,
    ) -> Result<Vec<DeviceDescriptor>, ClientError> {
        let window = window.unwrap_or_else(|| self.config.discovery.window());
        discovery::discover(&self.endpoint, &self.config.discovery, window, None).await
    }

    /// Probe for one device by identity token, returning as soon as it answers
    pub async fn find_device(
        &self,
        ble_mac: &str,
        window: Option<Duration>,
    ) -> Result<Option<DeviceDescriptor>, ClientError> {
        let window = window.unwrap_or_else(|| self.config.discovery.window());
        let found =
            discovery::discover(&self.endpoint, &self.config.discovery, window, Some(ble_mac))
                .await?;
        Ok(found.into_iter().next())
    }

    /// Handle for unicast calls to one device
    pub fn device(&self, target: DeviceTarget) -> VenusDevice {
        VenusDevice::new(self.endpoint.clone(), target)
    }
}
