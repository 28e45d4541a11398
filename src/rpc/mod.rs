//! Bounded-latency request/response calls over TCP or Unix sockets.

pub mod call;
pub mod codec;
pub mod error;
pub mod network;
pub mod server;

pub use call::{call, MIN_CALL_TIMEOUT};
pub use error::RpcError;
pub use network::Network;
pub use server::{serve, Endpoint, HandlerSet};
