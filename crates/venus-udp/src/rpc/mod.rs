//! JSON-RPC over UDP: envelope codec, method table and request correlation

pub mod codec;
pub mod endpoint;
pub mod methods;

pub use codec::{decode, encode_request, Decoded, Reply, RpcError, RpcRequest, RpcResponse};
pub use endpoint::RpcEndpoint;
pub use methods::Method;
