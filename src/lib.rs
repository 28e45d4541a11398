pub mod config;
pub mod rpc;
pub mod state;

// Public exports
pub use config::Config;
pub use rpc::{Endpoint, Network, RpcError};
pub use state::{LocalState, RemoteState, State, StateRecord};
