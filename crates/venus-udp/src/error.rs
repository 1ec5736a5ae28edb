//! Client errors
//!
//! Each failure class stays distinct so callers can tell an unreachable
//! device from a rejected request from bad input.

use thiserror::Error;
use venus_core::ValidationError;

use crate::rpc::codec::CodecError;
use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Socket could not be opened, bound or used
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// No matching reply within the retry budget
    #[error("No reply to {method} after {attempts} attempt(s)")]
    Timeout { method: String, attempts: u32 },

    /// The device answered with an error object
    #[error("Device error {code}: {message}")]
    Device { code: i64, message: String },

    /// Rejected locally before anything was sent
    #[error("Invalid {}: {0}", .0.field())]
    Validation(#[from] ValidationError),

    /// The reply could not be read as the expected shape
    #[error("Invalid response to {method}: {reason}")]
    InvalidResponse { method: String, reason: String },

    /// The device acknowledged a write but reported it was not applied
    #[error("Device did not apply {method}")]
    NotApplied { method: String },

    /// One write of a multi-slot schedule failed; later slots were not sent
    #[error("Schedule slot {index} write failed: {source}")]
    SlotWrite {
        index: u8,
        source: Box<ClientError>,
    },

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl ClientError {
    /// True for the routine "device did not answer" outcome
    pub fn is_timeout(&self) -> bool {
        match self {
            ClientError::Timeout { .. } => true,
            ClientError::SlotWrite { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}
