use std::time::Duration;

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::codec::{self, Request, Response};
use super::network::{self, Network};
use super::RpcError;

/// Smallest timeout a call honours; shorter values, zero included, are
/// raised to this so the attempt is always scheduled.
pub const MIN_CALL_TIMEOUT: Duration = Duration::from_millis(1);

/// Performs one request/response exchange with `address`, bounded by `timeout`.
///
/// The attempt (connect, send, receive) runs on its own task and is raced
/// against the timer. If the timer wins, [`RpcError::Timeout`] is returned and
/// the attempt is left running; it drops its connection once it finishes and
/// its result is discarded. The call is never retried.
pub async fn call<I, O>(
    network: Network,
    address: &str,
    timeout: Duration,
    method: &str,
    input: &I,
) -> Result<O, RpcError>
where
    I: Serialize + ?Sized,
    O: DeserializeOwned + Send + 'static,
{
    let request = Request {
        method: method.to_string(),
        payload: codec::encode(input)?,
    };
    let address = address.to_string();
    let timeout = timeout.max(MIN_CALL_TIMEOUT);

    let task = tokio::spawn(async move {
        let payload = attempt(network, &address, request).await?;
        codec::decode::<O>(&payload)
    });

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(RpcError::Transport(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("call task failed: {join_err}"),
        ))),
        Err(_) => {
            debug!("{method} timed out after {timeout:?}");
            Err(RpcError::Timeout)
        }
    }
}

async fn attempt(network: Network, address: &str, request: Request) -> Result<Vec<u8>, RpcError> {
    let mut stream = network::connect(network, address).await?;
    codec::write_frame(&mut stream, &request).await?;

    let response: Response = codec::read_frame(&mut stream).await?.ok_or_else(|| {
        RpcError::Transport(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed before response",
        ))
    })?;

    response.map_err(RpcError::Remote)
}
