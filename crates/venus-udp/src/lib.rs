//! venus-udp - Local-network client for Venus battery-storage devices
//!
//! This crate discovers devices by UDP broadcast and talks to them with a
//! small JSON-RPC dialect over a single shared socket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      VenusClient                            │
//! │                                                             │
//! │  ┌─────────────┐                    ┌─────────────────────┐ │
//! │  │ Discovery   │                    │ VenusDevice         │ │
//! │  │ (probes)    │                    │ (typed calls)       │ │
//! │  └──────┬──────┘                    └──────────┬──────────┘ │
//! │         │ tap                                  │ call       │
//! │         │          ┌─────────────┐             │            │
//! │         └──────────┤ RpcEndpoint ├─────────────┘            │
//! │                    │ (correlate) │                          │
//! │                    └──────┬──────┘                          │
//! │                           │                                 │
//! │                 ┌─────────┴─────────┐                       │
//! │                 │ DatagramTransport │                       │
//! │                 │ (UDP/mock)        │                       │
//! │                 └───────────────────┘                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Write payloads are validated by `venus-core` before any traffic is sent.

pub mod client;
pub mod config;
pub mod device;
pub mod discovery;
pub mod error;
pub mod rpc;
pub mod transport;

pub use client::VenusClient;
pub use config::{ClientConfig, DiscoveryConfig, RpcConfig, TransportConfig};
pub use device::{ClearReport, DeviceTarget, SlotFailure, VenusDevice};
pub use error::ClientError;
pub use rpc::RpcEndpoint;
pub use transport::{create_transport, DatagramTransport, MockTransport, TransportError};

// Re-export for convenience
pub use venus_core::{
    DeviceDescriptor, DeviceInfo, EnergySystemMode, ModeName, OperatingMode, ScheduleSlot,
    SlotMode, StatusKind, StatusReport, ValidationError, Weekdays,
};
