use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{method, Nil, State};
use crate::rpc::{self, Network, RpcError};

/// Pause between failed readiness probes.
pub const READY_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// A [`State`] held by another process.
///
/// Every operation is one bounded-latency call that dials a fresh
/// connection, so the handle owns nothing that needs closing.
#[derive(Debug, Clone)]
pub struct RemoteState {
    network: Network,
    location: String,
    timeout: Duration,
    ready_interval: Duration,
}

impl RemoteState {
    pub fn new(network: Network, location: &str, timeout: Duration) -> Self {
        Self {
            network,
            location: location.to_string(),
            timeout,
            ready_interval: READY_RETRY_INTERVAL,
        }
    }

    pub fn with_ready_interval(mut self, interval: Duration) -> Self {
        self.ready_interval = interval;
        self
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn call<I, O>(&self, method: &str, input: &I) -> Result<O, RpcError>
    where
        I: Serialize + Sync + ?Sized,
        O: DeserializeOwned + Send + 'static,
    {
        rpc::call(self.network, &self.location, self.timeout, method, input).await
    }

    async fn probe(&self) -> Result<(), RpcError> {
        self.call::<_, Nil>(method::PROBE, &Nil).await.map(|_| ())
    }

    /// Like [`State::ready`], but gives up once `limit` has elapsed and
    /// returns the error of the last probe.
    pub async fn ready_within(&self, limit: Duration) -> Result<(), RpcError> {
        let deadline = tokio::time::Instant::now() + limit;
        let mut last_err = RpcError::Timeout;

        loop {
            let probe = tokio::time::timeout_at(deadline, self.probe()).await;
            match probe {
                Ok(Ok(())) => {
                    info!("{}://{} is ready", self.network, self.location);
                    return Ok(());
                }
                Ok(Err(e)) => {
                    debug!("Probe of {} failed: {e}", self.location);
                    last_err = e;
                }
                Err(_) => return Err(last_err),
            }

            if tokio::time::timeout_at(deadline, tokio::time::sleep(self.ready_interval))
                .await
                .is_err()
            {
                return Err(last_err);
            }
        }
    }
}

#[async_trait]
impl State for RemoteState {
    /// Probes until the peer answers, pausing the retry interval after each
    /// failure. Never gives up.
    async fn ready(&self) {
        loop {
            match self.probe().await {
                Ok(()) => break,
                Err(e) => debug!("Probe of {} failed: {e}", self.location),
            }
            tokio::time::sleep(self.ready_interval).await;
        }
        info!("{}://{} is ready", self.network, self.location);
    }

    async fn set_synced(&self, synced: bool) -> Result<(), RpcError> {
        self.call::<_, bool>(method::SET_SYNCED, &synced).await.map(|_| ())
    }

    async fn has_synced(&self) -> Result<bool, RpcError> {
        self.call(method::GET_SYNCED, &true).await
    }

    async fn data_dir(&self) -> Result<String, RpcError> {
        self.call(method::GET_DATA_DIR, &Nil).await
    }

    async fn role(&self) -> Result<String, RpcError> {
        self.call(method::GET_ROLE, &Nil).await
    }

    async fn db_role(&self) -> Result<String, RpcError> {
        self.call(method::GET_DB_ROLE, &Nil).await
    }

    async fn set_db_role(&self, _role: String) -> Result<(), RpcError> {
        Err(RpcError::NotSupported)
    }

    fn location(&self) -> String {
        self.location.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_keeps_parameters() {
        let remote = RemoteState::new(Network::Unix, "/tmp/state.sock", Duration::from_millis(250));
        assert_eq!(remote.network(), Network::Unix);
        assert_eq!(remote.location(), "/tmp/state.sock");
        assert_eq!(remote.timeout(), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn set_db_role_is_refused_without_a_peer() {
        // Nothing listens on this path; the refusal must not depend on it.
        let remote = RemoteState::new(Network::Unix, "/nonexistent/state.sock", Duration::from_secs(1));
        let res = remote.set_db_role("replica".to_string()).await;
        assert!(matches!(res, Err(RpcError::NotSupported)));
    }

    #[tokio::test]
    async fn ready_within_returns_last_probe_error() {
        let remote = RemoteState::new(Network::Unix, "/nonexistent/state.sock", Duration::from_millis(100))
            .with_ready_interval(Duration::from_millis(20));

        let res = remote.ready_within(Duration::from_millis(150)).await;
        match res {
            Err(RpcError::Transport(_)) => {}
            other => panic!("expected Transport error, got {other:?}"),
        }
    }
}
