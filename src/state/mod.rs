//! State fields shared between an owning process and its remote observers.
//!
//! [`State`] is implemented by [`LocalState`], which holds the fields, and by
//! [`RemoteState`], which forwards every operation to a process exposing a
//! `LocalState` over the network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::rpc::RpcError;

pub mod handlers;
pub mod local;
pub mod remote;

pub use local::LocalState;
pub use remote::{RemoteState, READY_RETRY_INTERVAL};

/// Method names of the procedure surface.
pub mod method {
    pub const PROBE: &str = "probe";
    pub const GET_DATA_DIR: &str = "get-datadir";
    pub const GET_ROLE: &str = "get-role";
    pub const GET_DB_ROLE: &str = "get-dbrole";
    pub const GET_SYNCED: &str = "get-synced";
    pub const SET_SYNCED: &str = "set-synced";
}

/// Zero-size argument and reply of payload-free calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nil;

/// Fields owned by the serving process. Last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    pub data_dir: String,
    pub role: String,
    pub db_role: String,
    pub synced: bool,
}

#[async_trait]
pub trait State: Send + Sync {
    /// Waits until the state can be used. Never fails.
    async fn ready(&self);

    async fn set_synced(&self, synced: bool) -> Result<(), RpcError>;

    async fn has_synced(&self) -> Result<bool, RpcError>;

    async fn data_dir(&self) -> Result<String, RpcError>;

    async fn role(&self) -> Result<String, RpcError>;

    async fn db_role(&self) -> Result<String, RpcError>;

    /// Not every implementation accepts this; [`RemoteState`] always
    /// answers [`RpcError::NotSupported`].
    async fn set_db_role(&self, role: String) -> Result<(), RpcError>;

    /// Where the state lives.
    fn location(&self) -> String;
}
