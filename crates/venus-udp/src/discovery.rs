//! Broadcast device discovery
//!
//! A single probe is not enough: the device misses or drops a fair share of
//! them. Probes are therefore repeated at a fixed interval for the whole
//! window while replies are collected from the endpoint's tap.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};
use venus_core::{DeviceDescriptor, DeviceInfo};

use crate::config::DiscoveryConfig;
use crate::error::ClientError;
use crate::rpc::codec::{self, Decoded, Reply, DISCOVERY_REQUEST_ID};
use crate::rpc::{methods, RpcEndpoint};
use crate::transport::{Datagram, TransportError};

/// Descriptors keyed by identity token, in first-seen order
#[derive(Debug, Default)]
struct DeviceSet {
    devices: Vec<DeviceDescriptor>,
}

impl DeviceSet {
    /// Insert or replace; returns true for a new identity
    fn upsert(&mut self, device: DeviceDescriptor) -> bool {
        match self
            .devices
            .iter_mut()
            .find(|d| d.identity() == device.identity())
        {
            Some(existing) => {
                *existing = device;
                false
            }
            None => {
                self.devices.push(device);
                true
            }
        }
    }

    fn contains(&self, ble_mac: &str) -> bool {
        self.devices.iter().any(|d| d.identity() == ble_mac)
    }
}

/// Turn one datagram into a descriptor if it is a genuine discovery reply
pub fn accept_reply(datagram: &Datagram) -> Option<DeviceDescriptor> {
    let response = match codec::decode(&datagram.data) {
        Decoded::Response(response) => response,
        Decoded::Request(_) | Decoded::Noise => {
            trace!(source = %datagram.source, "Discarding echo or noise");
            return None;
        }
    };
    if response.id != DISCOVERY_REQUEST_ID || !response.is_device_reply() {
        return None;
    }
    let Reply::Result(result) = response.reply else {
        return None;
    };
    let info: DeviceInfo = serde_json::from_value(result).ok()?;
    DeviceDescriptor::from_info(info, datagram.source.ip())
}

/// Run one discovery pass
///
/// With `filter` set, only that identity is probed for and the pass ends as
/// soon as it answers. A transport that cannot send the first probe, or that
/// closes, aborts the pass; a later failed probe is logged and the pass keeps
/// listening. Finding nothing is not an error.
pub async fn discover(
    endpoint: &RpcEndpoint,
    config: &DiscoveryConfig,
    window: Duration,
    filter: Option<&str>,
) -> Result<Vec<DeviceDescriptor>, ClientError> {
    let _pass = endpoint.discovery_pass().await;

    let mut replies = endpoint.subscribe();
    let probe = codec::encode_request(&methods::discovery_probe(filter))?;
    let target = SocketAddr::new(config.broadcast_addr, config.port);
    let read_timeout = config.read_timeout();

    let mut ticker = tokio::time::interval(config.probe_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let deadline = Instant::now() + window;
    let mut found = DeviceSet::default();
    let mut probes = 0u32;

    debug!(%target, ?window, filter, "Starting discovery");

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {
                match endpoint.transport().send_to(&probe, target).await {
                    Ok(()) => {
                        probes += 1;
                        debug!(probe = probes, "Sent discovery probe");
                    }
                    Err(e) if probes == 0 || matches!(e, TransportError::Closed) => {
                        return Err(e.into());
                    }
                    Err(e) => warn!(%e, "Failed to send discovery probe, still listening"),
                }
            }
            received = tokio::time::timeout(remaining.min(read_timeout), replies.recv()) => {
                match received {
                    Ok(Ok(datagram)) => {
                        let Some(device) = accept_reply(&datagram) else {
                            continue;
                        };
                        if filter.is_some_and(|f| f != device.identity()) {
                            continue;
                        }
                        debug!(ble_mac = %device.ble_mac, ip = %device.ip, "Device replied");
                        if found.upsert(device) {
                            info!(count = found.devices.len(), "Found device");
                        }
                        if filter.is_some_and(|f| found.contains(f)) {
                            break;
                        }
                    }
                    Ok(Err(RecvError::Lagged(skipped))) => {
                        warn!(skipped, "Discovery fell behind, datagrams skipped");
                    }
                    Ok(Err(RecvError::Closed)) => {
                        return Err(TransportError::Closed.into());
                    }
                    Err(_) => {}
                }
            }
        }
    }

    info!(count = found.devices.len(), probes, "Discovery complete");
    Ok(found.devices)
}
