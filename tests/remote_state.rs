use std::time::{Duration, Instant};

use statelink::rpc::Network;
use statelink::{LocalState, RemoteState, RpcError, State};
use tokio::net::TcpListener;

async fn expose_sample() -> (LocalState, statelink::Endpoint) {
    let state = LocalState::new("/var/data", "leader", "primary");
    let endpoint = state
        .expose(Network::Tcp, "127.0.0.1:0")
        .await
        .expect("expose state");
    (state, endpoint)
}

#[tokio::test]
async fn remote_reads_and_writes_served_state() {
    let (local, endpoint) = expose_sample().await;
    let remote = RemoteState::new(Network::Tcp, endpoint.local_addr(), Duration::from_secs(2));

    assert_eq!(remote.data_dir().await.unwrap(), "/var/data");
    assert_eq!(remote.role().await.unwrap(), "leader");
    assert_eq!(remote.db_role().await.unwrap(), "primary");
    assert!(!remote.has_synced().await.unwrap());

    remote.set_synced(true).await.unwrap();
    assert!(remote.has_synced().await.unwrap());
    assert!(local.has_synced().await.unwrap());

    assert_eq!(remote.location(), endpoint.local_addr());
}

#[tokio::test]
async fn local_changes_are_visible_remotely() {
    let (local, endpoint) = expose_sample().await;
    let remote = RemoteState::new(Network::Tcp, endpoint.local_addr(), Duration::from_secs(2));

    local.set_role("follower");
    local.set_db_role("replica".to_string()).await.unwrap();

    assert_eq!(remote.role().await.unwrap(), "follower");
    assert_eq!(remote.db_role().await.unwrap(), "replica");
}

#[tokio::test]
async fn handles_to_the_same_endpoint_share_one_record() {
    let (_local, endpoint) = expose_sample().await;
    let writer = RemoteState::new(Network::Tcp, endpoint.local_addr(), Duration::from_secs(2));
    let reader = RemoteState::new(Network::Tcp, endpoint.local_addr(), Duration::from_secs(2));

    writer.set_synced(true).await.unwrap();
    assert!(reader.has_synced().await.unwrap());
}

#[tokio::test]
async fn concurrent_calls_through_one_handle_are_independent() {
    let (_local, endpoint) = expose_sample().await;
    let remote = RemoteState::new(Network::Tcp, endpoint.local_addr(), Duration::from_secs(2));

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let remote = remote.clone();
        tasks.push(tokio::spawn(async move { remote.data_dir().await }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), "/var/data");
    }
}

#[tokio::test]
async fn set_db_role_is_refused_without_contacting_the_peer() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let remote = RemoteState::new(Network::Tcp, &addr, Duration::from_secs(2));

    let res = remote.set_db_role("replica".to_string()).await;
    assert!(matches!(res, Err(RpcError::NotSupported)));

    let accepted = tokio::time::timeout(Duration::from_millis(200), listener.accept()).await;
    assert!(accepted.is_err(), "set_db_role must not open a connection");
}

#[tokio::test]
async fn unresponsive_peer_times_out() {
    // Bound but never accepted: the kernel completes the handshake and the
    // request sits unread.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let remote = RemoteState::new(Network::Tcp, &addr, Duration::from_millis(200));

    let start = Instant::now();
    let res = remote.role().await;
    let elapsed = start.elapsed();

    assert!(matches!(res, Err(RpcError::Timeout)), "got {res:?}");
    assert!(elapsed >= Duration::from_millis(200), "returned after {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1000), "returned after {elapsed:?}");
    drop(listener);
}

#[tokio::test]
async fn closed_endpoint_fails_calls() {
    let (_local, endpoint) = expose_sample().await;
    let addr = endpoint.local_addr().to_string();
    endpoint.close();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let remote = RemoteState::new(Network::Tcp, &addr, Duration::from_secs(2));
    let err = remote.data_dir().await.unwrap_err();
    assert!(err.is_transport(), "got {err:?}");
}

#[cfg(unix)]
#[tokio::test]
async fn state_is_served_over_unix_sockets() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.sock");
    let path_str = path.to_str().unwrap().to_string();

    let local = LocalState::new("/var/data", "leader", "primary");
    let endpoint = local.expose(Network::Unix, &path_str).await.unwrap();
    let remote = RemoteState::new(Network::Unix, &path_str, Duration::from_secs(2));

    assert_eq!(remote.data_dir().await.unwrap(), "/var/data");
    remote.set_synced(true).await.unwrap();
    assert!(local.has_synced().await.unwrap());

    endpoint.close();
    assert!(!path.exists(), "socket file should be removed on close");
}
