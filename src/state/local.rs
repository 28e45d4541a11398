use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::{handlers, State, StateRecord};
use crate::rpc::{self, Endpoint, Network, RpcError};

/// Reported by [`LocalState::location`].
pub const LOCAL_LOCATION: &str = "local";

/// In-process state record. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct LocalState {
    record: Arc<RwLock<StateRecord>>,
}

impl LocalState {
    pub fn new(data_dir: &str, role: &str, db_role: &str) -> Self {
        Self::from_record(StateRecord {
            data_dir: data_dir.to_string(),
            role: role.to_string(),
            db_role: db_role.to_string(),
            synced: false,
        })
    }

    pub fn from_record(record: StateRecord) -> Self {
        Self {
            record: Arc::new(RwLock::new(record)),
        }
    }

    pub fn snapshot(&self) -> StateRecord {
        self.read().clone()
    }

    pub fn set_data_dir(&self, data_dir: &str) {
        self.write().data_dir = data_dir.to_string();
    }

    pub fn set_role(&self, role: &str) {
        self.write().role = role.to_string();
    }

    /// Serves this record's procedures on `address` until the returned
    /// endpoint is dropped.
    pub async fn expose(&self, network: Network, address: &str) -> Result<Endpoint, RpcError> {
        rpc::serve(network, address, handlers::state_handlers(self.clone())).await
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, StateRecord> {
        self.record.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, StateRecord> {
        self.record.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl State for LocalState {
    async fn ready(&self) {}

    async fn set_synced(&self, synced: bool) -> Result<(), RpcError> {
        self.write().synced = synced;
        Ok(())
    }

    async fn has_synced(&self) -> Result<bool, RpcError> {
        Ok(self.read().synced)
    }

    async fn data_dir(&self) -> Result<String, RpcError> {
        Ok(self.read().data_dir.clone())
    }

    async fn role(&self) -> Result<String, RpcError> {
        Ok(self.read().role.clone())
    }

    async fn db_role(&self) -> Result<String, RpcError> {
        Ok(self.read().db_role.clone())
    }

    async fn set_db_role(&self, role: String) -> Result<(), RpcError> {
        self.write().db_role = role;
        Ok(())
    }

    fn location(&self) -> String {
        LOCAL_LOCATION.to_string()
    }
}
