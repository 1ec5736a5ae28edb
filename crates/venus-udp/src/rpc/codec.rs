//! JSON envelope encoding and decoding
//!
//! Stateless. Anything that is not a well-formed envelope decodes to
//! [`Decoded::Noise`] instead of an error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Request id used by discovery probes and their replies
pub const DISCOVERY_REQUEST_ID: u32 = 0;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Failed to encode {method}: {reason}")]
    Encode { method: String, reason: String },
}

/// Outbound request envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub id: u32,
    pub method: String,
    pub params: Value,
}

impl RpcRequest {
    pub fn new(id: u32, method: impl Into<String>, params: Value) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }
}

/// Error object carried by a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Payload of a reply: exactly one of result or error
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Result(Value),
    Error(RpcError),
}

/// Inbound reply envelope
#[derive(Debug, Clone, PartialEq)]
pub struct RpcResponse {
    pub id: u32,
    pub src: Option<String>,
    pub reply: Reply,
}

impl RpcResponse {
    pub fn result(id: u32, src: Option<String>, result: Value) -> Self {
        Self {
            id,
            src,
            reply: Reply::Result(result),
        }
    }

    pub fn error(id: u32, code: i64, message: impl Into<String>) -> Self {
        Self {
            id,
            src: None,
            reply: Reply::Error(RpcError {
                code,
                message: message.into(),
            }),
        }
    }

    /// True when the reply carries a non-empty result or source tag
    ///
    /// Loopback copies of our own probes never do.
    pub fn is_device_reply(&self) -> bool {
        let has_src = self.src.as_deref().is_some_and(|s| !s.trim().is_empty());
        let has_result = match &self.reply {
            Reply::Result(Value::Object(map)) => !map.is_empty(),
            Reply::Result(Value::Null) => false,
            Reply::Result(_) => true,
            Reply::Error(_) => false,
        };
        has_src || has_result
    }
}

/// Outcome of decoding one datagram
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A reply carrying a result or an error
    Response(RpcResponse),
    /// A request envelope, e.g. our own probe looped back
    Request(RpcRequest),
    /// Anything else
    Noise,
}

#[derive(Deserialize)]
struct RawEnvelope {
    id: Option<u32>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    src: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

/// Encode a request as `{"id","method","params"}`
pub fn encode_request(request: &RpcRequest) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(request).map_err(|e| CodecError::Encode {
        method: request.method.clone(),
        reason: e.to_string(),
    })
}

/// Encode a reply envelope
pub fn encode_response(response: &RpcResponse) -> Result<Vec<u8>, CodecError> {
    let mut envelope = Map::new();
    envelope.insert("id".into(), Value::from(response.id));
    if let Some(src) = &response.src {
        envelope.insert("src".into(), Value::from(src.clone()));
    }
    match &response.reply {
        Reply::Result(result) => {
            envelope.insert("result".into(), result.clone());
        }
        Reply::Error(error) => {
            let error = serde_json::to_value(error).map_err(|e| CodecError::Encode {
                method: "error".into(),
                reason: e.to_string(),
            })?;
            envelope.insert("error".into(), error);
        }
    }
    serde_json::to_vec(&Value::Object(envelope)).map_err(|e| CodecError::Encode {
        method: "response".into(),
        reason: e.to_string(),
    })
}

/// Decode one datagram
pub fn decode(bytes: &[u8]) -> Decoded {
    let Ok(raw) = serde_json::from_slice::<RawEnvelope>(bytes) else {
        return Decoded::Noise;
    };
    let Some(id) = raw.id else {
        return Decoded::Noise;
    };

    // Result takes precedence when both are present
    if let Some(result) = raw.result {
        return Decoded::Response(RpcResponse {
            id,
            src: raw.src,
            reply: Reply::Result(result),
        });
    }
    if let Some(error) = raw.error {
        return Decoded::Response(RpcResponse {
            id,
            src: raw.src,
            reply: Reply::Error(error),
        });
    }
    match raw.method {
        Some(method) => Decoded::Request(RpcRequest {
            id,
            method,
            params: raw.params.unwrap_or(Value::Null),
        }),
        None => Decoded::Noise,
    }
}
