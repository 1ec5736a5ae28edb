//! Request correlation over the shared transport
//!
//! One background task owns the receive side of the transport. Every datagram
//! it reads is first copied to the tap channel (discovery listens there) and
//! then decoded; a reply whose id is registered in the pending table, and
//! which comes from the device that call was sent to, is handed to that single
//! waiter and the entry is removed. Anything else is dropped.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::codec::{self, Decoded, Reply, RpcRequest, RpcResponse, DISCOVERY_REQUEST_ID};
use crate::config::RpcConfig;
use crate::error::ClientError;
use crate::transport::{Datagram, DatagramTransport, TransportError};

type PendingTable = Arc<Mutex<HashMap<u32, Waiter>>>;

/// An outstanding call: the device it addressed and where to deliver the reply
struct Waiter {
    device: IpAddr,
    tx: oneshot::Sender<RpcResponse>,
}

/// Pause after a receive error before reading again
const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Shared request/response endpoint
pub struct RpcEndpoint {
    transport: Arc<dyn DatagramTransport>,
    config: RpcConfig,
    pending: PendingTable,
    next_id: Mutex<u32>,
    tap: broadcast::Sender<Datagram>,
    running: Arc<AtomicBool>,
    pump: Mutex<Option<JoinHandle<()>>>,
    discovery: tokio::sync::Mutex<()>,
}

impl RpcEndpoint {
    /// Wrap a transport and start the receive task
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(transport: Arc<dyn DatagramTransport>, config: RpcConfig) -> Self {
        let (tap, _) = broadcast::channel(256);
        let endpoint = Self {
            transport,
            config,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: Mutex::new(DISCOVERY_REQUEST_ID),
            tap,
            running: Arc::new(AtomicBool::new(true)),
            pump: Mutex::new(None),
            discovery: tokio::sync::Mutex::new(()),
        };
        endpoint.start_pump();
        endpoint
    }

    pub fn transport(&self) -> &Arc<dyn DatagramTransport> {
        &self.transport
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Receive a copy of every inbound datagram
    pub fn subscribe(&self) -> broadcast::Receiver<Datagram> {
        self.tap.subscribe()
    }

    /// Number of calls currently waiting for a reply
    pub fn pending_calls(&self) -> usize {
        self.pending.lock().len()
    }

    /// Serialize discovery passes
    pub(crate) async fn discovery_pass(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.discovery.lock().await
    }

    fn start_pump(&self) {
        let transport = self.transport.clone();
        let pending = self.pending.clone();
        let tap = self.tap.clone();
        let running = self.running.clone();
        let poll = self.config.receive_poll();

        let handle = tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                match transport.recv_timeout(poll).await {
                    Ok(Some(datagram)) => {
                        let _ = tap.send(datagram.clone());
                        Self::dispatch(&pending, &datagram);
                    }
                    Ok(None) => {}
                    Err(TransportError::Closed) => {
                        debug!("Transport closed, stopping receive task");
                        break;
                    }
                    Err(e) => {
                        warn!(%e, "Receive error");
                        tokio::time::sleep(RECEIVE_ERROR_BACKOFF).await;
                    }
                }
            }
            // Waiters see their sender dropped
            pending.lock().clear();
        });

        *self.pump.lock() = Some(handle);
    }

    /// Route one datagram to at most one waiter
    fn dispatch(pending: &Mutex<HashMap<u32, Waiter>>, datagram: &Datagram) {
        match codec::decode(&datagram.data) {
            Decoded::Response(response) if response.id != DISCOVERY_REQUEST_ID => {
                let waiter = {
                    let mut pending = pending.lock();
                    let from_target = pending
                        .get(&response.id)
                        .is_some_and(|w| w.device == datagram.source.ip());
                    if from_target {
                        pending.remove(&response.id)
                    } else {
                        None
                    }
                };
                match waiter {
                    Some(waiter) => {
                        let _ = waiter.tx.send(response);
                    }
                    None => trace!(
                        id = response.id,
                        source = %datagram.source,
                        "Dropping unmatched response"
                    ),
                }
            }
            Decoded::Response(_) => {}
            Decoded::Request(request) => {
                trace!(method = %request.method, source = %datagram.source, "Ignoring request echo")
            }
            Decoded::Noise => trace!(source = %datagram.source, "Ignoring undecodable datagram"),
        }
    }

    /// Reserve an id not in use by any outstanding call
    fn reserve(&self, device: IpAddr) -> (PendingGuard, oneshot::Receiver<RpcResponse>) {
        let (tx, rx) = oneshot::channel();
        let mut pending = self.pending.lock();
        let mut next = self.next_id.lock();

        let id = loop {
            *next = next.wrapping_add(1);
            if *next == DISCOVERY_REQUEST_ID {
                continue;
            }
            if !pending.contains_key(&*next) {
                break *next;
            }
        };
        pending.insert(id, Waiter { device, tx });

        let guard = PendingGuard {
            id,
            pending: self.pending.clone(),
        };
        (guard, rx)
    }

    /// Perform one logical call to `device`
    ///
    /// The request is sent up to `max_attempts` times under the same id. A
    /// reply from `device` to any transmission completes the call; the same id
    /// answered from another address is ignored. Device errors and
    /// transport failures are returned immediately without retrying.
    pub async fn call(
        &self,
        device: IpAddr,
        method: &str,
        params: Value,
    ) -> Result<Value, ClientError> {
        let dest = SocketAddr::new(device, self.config.device_port);
        let max_attempts = self.config.max_attempts.max(1);
        let attempt_timeout = self.config.attempt_timeout();

        let (guard, mut rx) = self.reserve(device);
        let request = RpcRequest::new(guard.id, method, params);
        let bytes = codec::encode_request(&request)?;

        for attempt in 1..=max_attempts {
            debug!(id = guard.id, method, attempt, max_attempts, %dest, "Sending request");
            self.transport.send_to(&bytes, dest).await?;

            match tokio::time::timeout(attempt_timeout, &mut rx).await {
                Ok(Ok(response)) => {
                    return match response.reply {
                        Reply::Result(result) => Ok(result),
                        Reply::Error(error) => Err(ClientError::Device {
                            code: error.code,
                            message: error.message,
                        }),
                    };
                }
                Ok(Err(_)) => return Err(TransportError::Closed.into()),
                Err(_) => debug!(id = guard.id, method, attempt, "No reply within attempt timeout"),
            }
        }

        info!(method, attempts = max_attempts, %dest, "Request timed out");
        Err(ClientError::Timeout {
            method: method.to_string(),
            attempts: max_attempts,
        })
    }
}

impl Drop for RpcEndpoint {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.pump.lock().take() {
            handle.abort();
        }
    }
}

/// Releases a request id when its call finishes or is abandoned
struct PendingGuard {
    id: u32,
    pending: PendingTable,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.id);
    }
}
